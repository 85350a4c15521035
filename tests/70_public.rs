mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::{Datelike, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use asso_admin_api::database::Repository;
use asso_admin_api::models::adhesion::BureauMember;

use common::{id_of, TestApp};

#[tokio::test]
async fn contact_form_notifies_the_association_inbox() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .public_post(
            "/api/public/contact",
            json!({ "nom": "Jeanne", "email": "Jeanne@Example.org", "message": "Bonjour, je voudrais des informations." }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    app.state.effects.flush().await;

    let sent = app.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "contact.message");
    assert_eq!(sent[0].to, vec![app.state.config.notifications.contact_recipient.clone()]);
    assert_eq!(sent[0].subject, "[Contact] Message depuis le formulaire de contact");
    assert_eq!(sent[0].payload["email"], "jeanne@example.org");

    let res = app.public_post("/api/public/contact", json!({ "nom": "Jeanne", "email": "jeanne@example.org", "message": "court" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["errors"][0]["field"], "message");
    Ok(())
}

#[tokio::test]
async fn public_application_lands_pending_then_gets_a_number() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let application = json!({ "prenom": "Rokhaya", "nom": "Diop", "email": "rokhaya@example.org", "pays": "Sénégal" });
    let res = app.public_post("/api/public/adhesion", application.clone()).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["statut"], "pending");
    assert!(res.data()["numero_membre"].is_null());
    let id = id_of(&res)?;

    let res = app.public_post("/api/public/adhesion", application).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.post(&format!("/api/adhesion/membres/{}/approve", id), &token, json!({})).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    assert_eq!(res.data()["statut"], "approved");
    assert_eq!(res.data()["numero_membre"], format!("ADH-{}-0001", Utc::now().year()));

    let res = app.post(&format!("/api/adhesion/membres/{}/approve", id), &token, json!({})).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    app.state.effects.flush().await;
    let events: Vec<String> = app.notifier.sent().await.into_iter().map(|e| e.event).collect();
    assert_eq!(events, vec!["adhesion.received", "adhesion.approved"]);
    Ok(())
}

#[tokio::test]
async fn candidatures_need_an_open_offre() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();

    let mut offres = Vec::new();
    for body in [
        json!({ "titre": "Stage data", "type_contrat": "stage" }),
        json!({ "titre": "Stage web", "type_contrat": "stage", "statut": "fermee" }),
        json!({ "titre": "Stage design", "type_contrat": "stage", "date_limite": yesterday }),
    ] {
        let res = app.post("/api/recrutement/offres", &token, body).await?;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
        offres.push(id_of(&res)?);
    }

    let candidature = json!({ "prenom": "Idrissa", "nom": "Seck", "email": "idrissa@example.org" });
    let res = app.public_post(&format!("/api/public/offres/{}/candidatures", offres[0]), candidature.clone()).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["statut"], "recue");

    let res = app.public_post(&format!("/api/public/offres/{}/candidatures", offres[0]), candidature.clone()).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    for closed in &offres[1..] {
        let res = app.public_post(&format!("/api/public/offres/{}/candidatures", closed), candidature.clone()).await?;
        assert_eq!(res.status, StatusCode::CONFLICT);
    }

    // Staff can still file one by hand
    let res = app.post(&format!("/api/recrutement/offres/{}/candidatures", offres[1]), &token, candidature).await?;
    assert_eq!(res.status, StatusCode::CREATED);

    let res = app.public_post(&format!("/api/public/offres/{}/candidatures", Uuid::new_v4()), json!({ "prenom": "X", "nom": "Y", "email": "x@y.org" })).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn public_bureau_hides_contact_details() -> Result<()> {
    let app = TestApp::new();
    for (prenom, poste, ordre, is_active) in [("Astou", "Trésorière", 2, true), ("Mamadou", "Président", 1, true), ("Ancien", "Secrétaire", 3, false)] {
        app.state
            .repos
            .bureau
            .insert(&BureauMember {
                id: Uuid::new_v4(),
                prenom: prenom.to_string(),
                nom: "Bureau".to_string(),
                poste: poste.to_string(),
                photo_url: None,
                email: Some(format!("{}@asso.test", prenom.to_lowercase())),
                ordre,
                is_active,
                created_at: Utc::now(),
            })
            .await?;
    }

    let res = app.send(Method::GET, "/api/public/bureau", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let bureau = res.data();
    let list = bureau.as_array().cloned().unwrap_or_default();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["poste"], "Président");
    assert!(list.iter().all(|m| m.get("email").is_none()));
    Ok(())
}

#[tokio::test]
async fn projet_inscriptions_close_with_the_projet() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app.post("/api/secretariat/projets", &token, json!({ "titre": "Journée d'intégration" })).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["slug"], "journee-d-integration");
    let projet_id = id_of(&res)?;
    let public = format!("/api/public/projets/{}/inscriptions", projet_id);

    let volunteer = json!({ "prenom": "Fatou", "nom": "Ba", "email": "Fatou.Ba@example.org", "motivation": "Aider à l'accueil" });
    let res = app.public_post(&public, volunteer.clone()).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["email"], "fatou.ba@example.org");

    let res = app.public_post(&public, volunteer.clone()).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.get(&format!("/api/secretariat/projets/{}/inscriptions", projet_id), &token).await?;
    assert_eq!(res.json()["pagination"]["total"], 1);

    let res = app.put(&format!("/api/secretariat/projets/{}", projet_id), &token, json!({ "is_active": false })).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    let res = app.public_post(&public, json!({ "prenom": "Ousmane", "nom": "Fall", "email": "ousmane@example.org" })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    app.state.effects.flush().await;
    let events: Vec<String> = app.notifier.sent().await.into_iter().map(|e| e.event).collect();
    assert_eq!(events, vec!["projet.inscription"]);
    Ok(())
}
