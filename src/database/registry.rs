use std::sync::Arc;

use sqlx::PgPool;

use crate::database::memory::MemoryRepository;
use crate::database::postgres::PgRepository;
use crate::database::repository::Repository;
use crate::models::{
    adhesion::*, admin::*, audit::*, formation::*, mentorat::*, recrutement::*, secretariat::*, tresorerie::*,
    webinaire::*,
};

macro_rules! repositories {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// One repository handle per entity, all backed by the same store
        #[derive(Clone)]
        pub struct Repositories {
            $(pub $field: Arc<dyn Repository<$ty>>,)*
        }

        impl Repositories {
            pub fn postgres(pool: PgPool) -> Self {
                Self {
                    $($field: Arc::new(PgRepository::<$ty>::new(pool.clone())),)*
                }
            }

            pub fn memory() -> Self {
                Self {
                    $($field: Arc::new(MemoryRepository::<$ty>::new()),)*
                }
            }
        }
    };
}

repositories! {
    admins: Admin,
    admin_modules: AdminModule,
    audit_logs: AuditLogEntry,

    members: Member,
    bureau: BureauMember,

    formations: Formation,
    formation_sessions: FormationSession,
    formation_inscriptions: FormationInscription,

    webinaires: Webinaire,
    webinaire_inscriptions: WebinaireInscription,
    presentateurs: Presentateur,
    webinaire_stats: WebinaireStats,

    groupes: GroupeTravail,
    groupe_membres: GroupeMembre,
    projets: Projet,
    projet_inscriptions: ProjetInscription,
    reunions: Reunion,
    participants: ParticipantReunion,
    comptes_rendus: CompteRendu,
    actions: ActionItem,
    action_assignees: ActionAssignee,
    documents: DocumentReunion,
    rapports: RapportPresidence,

    cotisations: Cotisation,
    paiements: Paiement,
    depenses: Depense,
    cartes: CarteMembre,
    historique: HistoriqueTresorerie,

    mentors: Mentor,
    mentores: Mentore,
    binomes: Binome,

    offres: Offre,
    candidatures: Candidature,
}
