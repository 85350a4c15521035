mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use asso_admin_api::database::Repository;
use asso_admin_api::filter::Filter;
use asso_admin_api::models::adhesion::MemberStatus;

use common::{id_of, TestApp};

fn names(participants: &Value) -> Vec<String> {
    let mut names: Vec<String> = participants
        .as_array()
        .map(|list| list.iter().filter_map(|p| p["nom"].as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn reunion_lifecycle_from_invitation_to_pdf() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;
    let aminata = app.seed_member("Aminata", "Diallo", Some("France"), MemberStatus::Approved).await?;
    let ousmane = app.seed_member("Ousmane", "Ba", Some("Sénégal"), MemberStatus::Approved).await?;
    let khady = app.seed_member("Khady", "Fall", None, MemberStatus::Approved).await?;

    let res = app.post("/api/secretariat/groupes", &token, json!({ "nom": "Communication" })).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let groupe_id = id_of(&res)?;
    for membre in [&aminata, &ousmane] {
        let res = app
            .post(&format!("/api/secretariat/groupes/{}/membres", groupe_id), &token, json!({ "membre_id": membre.id }))
            .await?;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    }

    // Group members are invited, extra invitees are merged without duplicates
    let res = app
        .post(
            "/api/secretariat/reunions",
            &token,
            json!({
                "type_reunion": "groupe_travail",
                "titre": "Conseil de janvier",
                "date_reunion": "2025-01-15",
                "heure_debut": "18:30",
                "groupe_travail_id": groupe_id,
                "participants": [khady.id, aminata.id]
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let reunion = res.data();
    let reunion_id = id_of(&res)?;
    assert_eq!(reunion["statut"], "planifiee");
    assert_eq!(names(&reunion["participants"]), vec!["Aminata Diallo", "Khady Fall", "Ousmane Ba"]);
    assert!(reunion["participants"]
        .as_array()
        .is_some_and(|list| list.iter().all(|p| p["statut_invitation"] == "envoye")));

    let participant_of = |membre_id: String| {
        reunion["participants"]
            .as_array()
            .and_then(|list| list.iter().find(|p| p["membre_id"] == membre_id.as_str()))
            .and_then(|p| p["id"].as_str())
            .map(str::to_string)
            .unwrap_or_default()
    };
    let aminata_pid = participant_of(aminata.id.to_string());
    let ousmane_pid = participant_of(ousmane.id.to_string());

    let res = app
        .post(
            &format!("/api/secretariat/reunions/{}/participants", reunion_id),
            &token,
            json!({ "membre_id": khady.id }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .put(
            &format!("/api/secretariat/reunions/{}/participants/{}/presence", reunion_id, aminata_pid),
            &token,
            json!({ "presence": "present", "motif_absence": "ignored" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    assert!(res.data()["motif_absence"].is_null());

    let res = app
        .put(
            &format!("/api/secretariat/reunions/{}/participants/{}/presence", reunion_id, ousmane_pid),
            &token,
            json!({ "presence": "absent", "motif_absence": "En déplacement" }),
        )
        .await?;
    assert_eq!(res.data()["motif_absence"], "En déplacement");

    // First save without a roster takes the present participants
    let res = app
        .put(
            &format!("/api/secretariat/reunions/{}/compte-rendu", reunion_id),
            &token,
            json!({ "resume": "Point sur la rentrée", "decisions": "Budget voté" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    assert_eq!(res.data()["participants_list"], json!(["Aminata Diallo"]));

    let res = app
        .put(
            &format!("/api/secretariat/reunions/{}/compte-rendu", reunion_id),
            &token,
            json!({ "decisions": null }),
        )
        .await?;
    assert!(res.data()["decisions"].is_null());
    assert_eq!(res.data()["resume"], "Point sur la rentrée");

    // Saving again updates the same row
    let comptes_rendus = app.state.repos.comptes_rendus.count(&Filter::new().eq("reunion_id", &reunion_id)).await?;
    assert_eq!(comptes_rendus, 1);

    let res = app
        .post(
            "/api/secretariat/actions",
            &token,
            json!({
                "reunion_id": reunion_id,
                "titre": "Envoyer la convocation",
                "assignees": [ousmane.id, khady.id],
                "deadline": "2020-01-01"
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let action_id = id_of(&res)?;

    let res = app
        .post("/api/secretariat/actions", &token, json!({ "titre": "Action sans rattachement" }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["errors"][0]["field"], "reunion_id");

    // Only the accepted action is audited
    app.state.effects.flush().await;
    let res = app.get("/api/audit?entity_type=action", &token).await?;
    assert_eq!(res.json()["pagination"]["total"], 1, "{}", res.json());
    assert_eq!(res.data()[0]["entity_id"], action_id.as_str());
    assert_eq!(res.data()["assigne_a"], ousmane.id.to_string());
    assert_eq!(res.data()["en_retard"], true);
    assert_eq!(res.data()["assignees"].as_array().map(Vec::len), Some(2));

    let res = app.get("/api/secretariat/actions?en_retard=true", &token).await?;
    assert_eq!(res.data().as_array().map(Vec::len), Some(1));

    let res = app
        .put(&format!("/api/secretariat/actions/{}/statut", action_id), &token, json!({ "statut": "termine" }))
        .await?;
    assert_eq!(res.data()["en_retard"], false);
    let res = app.get("/api/secretariat/actions?en_retard=true", &token).await?;
    assert_eq!(res.data().as_array().map(Vec::len), Some(0));
    let res = app.get("/api/secretariat/actions?en_retard=false", &token).await?;
    assert_eq!(res.data().as_array().map(Vec::len), Some(1));

    let res = app.get(&format!("/api/secretariat/reunions/{}/pdf", reunion_id), &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("application/pdf"));
    assert_eq!(
        res.header("content-disposition"),
        Some("attachment; filename=\"compte-rendu-2025-01-15-conseil-de-janvier.pdf\"")
    );
    assert!(res.bytes.starts_with(b"%PDF-"));

    // Referenced by the reunion and its action
    let res = app.delete(&format!("/api/secretariat/groupes/{}", groupe_id), &token).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn reunion_rejects_unknown_invitees_and_bad_times() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app
        .post(
            "/api/secretariat/reunions",
            &token,
            json!({
                "type_reunion": "bureau",
                "titre": "Bureau",
                "date_reunion": "2025-02-01",
                "heure_debut": "25:00"
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/secretariat/reunions",
            &token,
            json!({
                "type_reunion": "bureau",
                "titre": "Bureau",
                "date_reunion": "2025-02-01",
                "heure_debut": "19:00",
                "participants": [uuid::Uuid::new_v4()]
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["errors"][0]["field"], "participants");
    Ok(())
}

#[tokio::test]
async fn presidency_report_is_stored_and_served() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    for (type_reunion, date) in [("ca", "2025-03-04"), ("bureau", "2025-03-20"), ("ag", "2025-05-02")] {
        let res = app
            .post(
                "/api/secretariat/reunions",
                &token,
                json!({ "type_reunion": type_reunion, "titre": "Séance", "date_reunion": date, "heure_debut": "10:00" }),
            )
            .await?;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    }

    let res = app
        .post("/api/secretariat/rapports", &token, json!({ "date_debut": "2025-03-31", "date_fin": "2025-03-01" }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post("/api/secretariat/rapports", &token, json!({ "date_debut": "2025-03-01", "date_fin": "2025-03-31" }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let rapport = res.data();
    let rapport_id = id_of(&res)?;
    assert_eq!(rapport["statistiques"]["reunions_total"], 2);
    assert_eq!(rapport["statistiques"]["reunions_par_type"]["ca"], 1);
    assert_eq!(rapport["statistiques"]["reunions_par_type"]["ag"], 0);
    assert!(rapport["resume"].as_str().is_some_and(|r| r.starts_with("Du 01/03/2025 au 31/03/2025 : 2 réunion(s)")));

    let res = app.get(&format!("/api/secretariat/rapports/{}/pdf", rapport_id), &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("application/pdf"));
    let digest: String = Sha256::digest(&res.bytes).iter().map(|b| format!("{:02x}", b)).collect();
    assert_eq!(rapport["sha256"], digest);

    let res = app.get("/api/secretariat/rapports", &token).await?;
    assert_eq!(res.json()["pagination"]["total"], 1);
    Ok(())
}
