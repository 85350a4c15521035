mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{id_of, TestApp};

fn inscription(prenom: &str) -> serde_json::Value {
    json!({ "prenom": prenom, "nom": "Test", "email": format!("{}@inscrits.test", prenom.to_lowercase()) })
}

#[tokio::test]
async fn formation_capacity_counts_confirmed_places() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app
        .post("/api/formation/formations", &token, json!({ "titre": "Initiation à Rust", "participants_max": 1 }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["slug"], "initiation-a-rust");
    let formation_id = id_of(&res)?;
    let inscriptions = format!("/api/formation/formations/{}/inscriptions", formation_id);

    let res = app.public_post(&format!("/api/public/formations/{}/inscriptions", formation_id), inscription("Binta")).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["statut"], "pending");
    let binta = id_of(&res)?;

    let res = app.public_post(&format!("/api/public/formations/{}/inscriptions", formation_id), inscription("BINTA")).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.post(&inscriptions, &token, inscription("Cheikh")).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    let cheikh = id_of(&res)?;

    let res = app
        .put(&format!("/api/formation/inscriptions/{}/statut", binta), &token, json!({ "statut": "confirmed" }))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());

    // The single place is taken
    let res = app
        .put(&format!("/api/formation/inscriptions/{}/statut", cheikh), &token, json!({ "statut": "confirmed" }))
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    let res = app.post(&inscriptions, &token, inscription("Daba")).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .put(&format!("/api/formation/inscriptions/{}/statut", binta), &token, json!({ "statut": "rejected" }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = app
        .put(&format!("/api/formation/inscriptions/{}/statut", cheikh), &token, json!({ "statut": "confirmed" }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn formation_with_inscriptions_is_deactivated_not_deleted() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app.post("/api/formation/formations", &token, json!({ "titre": "Sans inscrits" })).await?;
    let empty_id = id_of(&res)?;
    let res = app.delete(&format!("/api/formation/formations/{}", empty_id), &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["outcome"], "deleted");
    let res = app.get(&format!("/api/formation/formations/{}", empty_id), &token).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.post("/api/formation/formations", &token, json!({ "titre": "Avec inscrits" })).await?;
    let formation_id = id_of(&res)?;
    app.public_post(&format!("/api/public/formations/{}/inscriptions", formation_id), inscription("Ndeye")).await?;

    let res = app.delete(&format!("/api/formation/formations/{}", formation_id), &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["outcome"], "deactivated");

    let res = app.get(&format!("/api/formation/formations/{}", formation_id), &token).await?;
    assert_eq!(res.data()["is_active"], false);
    let res = app.public_post(&format!("/api/public/formations/{}/inscriptions", formation_id), inscription("Lamine")).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn webinaire_capacity_attendance_and_stats() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app
        .post(
            "/api/webinaire/webinaires",
            &token,
            json!({ "titre": "Financer ses études", "date_webinaire": "2025-04-10", "heure_debut": "19:00" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let draft_id = id_of(&res)?;
    let res = app.public_post(&format!("/api/public/webinaires/{}/inscriptions", draft_id), inscription("Awa")).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .post(
            "/api/webinaire/webinaires",
            &token,
            json!({
                "titre": "Trouver un stage",
                "date_webinaire": "2025-04-17",
                "heure_debut": "19:00",
                "capacite_max": 1,
                "statut": "publie"
            }),
        )
        .await?;
    let webinaire_id = id_of(&res)?;
    let base = format!("/api/webinaire/webinaires/{}/inscriptions", webinaire_id);

    let res = app.public_post(&format!("/api/public/webinaires/{}/inscriptions", webinaire_id), inscription("Awa")).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let awa = id_of(&res)?;

    let res = app.put(&format!("{}/{}/presence", base, awa), &token, json!({ "a_assiste": true })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.put(&format!("{}/{}/statut", base, awa), &token, json!({ "statut": "confirmed" })).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    let res = app.put(&format!("{}/{}/presence", base, awa), &token, json!({ "a_assiste": true })).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());

    let res = app.public_post(&format!("/api/public/webinaires/{}/inscriptions", webinaire_id), inscription("Modou")).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.get(&format!("/api/webinaire/webinaires/{}/stats", webinaire_id), &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["total_inscrits"], 1);
    assert_eq!(res.data()["confirmes"], 1);
    assert_eq!(res.data()["presents"], 1);

    let res = app.delete(&format!("/api/webinaire/webinaires/{}", webinaire_id), &token).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    // A refused delete leaves the webinaire and its inscription in place
    let res = app.get(&format!("/api/webinaire/webinaires/{}", webinaire_id), &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.get(&base, &token).await?;
    assert_eq!(res.json()["pagination"]["total"], 1);
    assert_eq!(res.data()[0]["id"], awa.as_str());
    Ok(())
}

#[tokio::test]
async fn capacity_cannot_drop_below_confirmed_inscriptions() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app
        .post("/api/formation/formations", &token, json!({ "titre": "Atelier CV", "participants_max": 3 }))
        .await?;
    let formation_id = id_of(&res)?;
    for prenom in ["Adama", "Coumba", "Pape"] {
        let res = app
            .post(&format!("/api/formation/formations/{}/inscriptions", formation_id), &token, inscription(prenom))
            .await?;
        let id = id_of(&res)?;
        let res = app
            .put(&format!("/api/formation/inscriptions/{}/statut", id), &token, json!({ "statut": "confirmed" }))
            .await?;
        assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    }

    let formation = format!("/api/formation/formations/{}", formation_id);
    let res = app.put(&formation, &token, json!({ "participants_max": 1 })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    let res = app.get(&formation, &token).await?;
    assert_eq!(res.data()["participants_max"], 3);
    let res = app.put(&formation, &token, json!({ "participants_max": 3 })).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());

    let res = app
        .post(
            "/api/webinaire/webinaires",
            &token,
            json!({
                "titre": "Préparer un entretien",
                "date_webinaire": "2025-05-15",
                "heure_debut": "18:30",
                "capacite_max": 2,
                "statut": "publie"
            }),
        )
        .await?;
    let webinaire_id = id_of(&res)?;
    let base = format!("/api/webinaire/webinaires/{}/inscriptions", webinaire_id);
    for prenom in ["Khady", "Malick"] {
        let res = app.post(&base, &token, inscription(prenom)).await?;
        let id = id_of(&res)?;
        let res = app.put(&format!("{}/{}/statut", base, id), &token, json!({ "statut": "confirmed" })).await?;
        assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    }

    let webinaire = format!("/api/webinaire/webinaires/{}", webinaire_id);
    let res = app.put(&webinaire, &token, json!({ "capacite_max": 1 })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    let res = app.put(&webinaire, &token, json!({ "capacite_max": 5 })).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    assert_eq!(res.data()["capacite_max"], 5);
    Ok(())
}
