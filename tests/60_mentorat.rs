mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use asso_admin_api::models::admin::{Droit, ModuleName};

use common::{id_of, TestApp};

async fn mentore(app: &TestApp, token: &str, prenom: &str) -> Result<String> {
    let res = app
        .post(
            "/api/mentorat/mentores",
            token,
            json!({ "prenom": prenom, "nom": "Mentoré", "email": format!("{}@mentores.test", prenom.to_lowercase()) }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    id_of(&res)
}

#[tokio::test]
async fn pairing_respects_capacity_and_exclusivity() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.admin_with("mentorat@asso.test", &[(ModuleName::Mentorat, Droit::Admin)]).await?;

    let res = app
        .post(
            "/api/mentorat/mentors",
            &token,
            json!({ "prenom": "Aïssatou", "nom": "Kane", "email": "aissatou@mentors.test", "capacite_max": 1 }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let kane = id_of(&res)?;
    let res = app
        .post("/api/mentorat/mentors", &token, json!({ "prenom": "Babacar", "nom": "Gueye", "email": "babacar@mentors.test" }))
        .await?;
    let gueye = id_of(&res)?;

    let lena = mentore(&app, &token, "Lena").await?;
    let omar = mentore(&app, &token, "Omar").await?;

    let res = app.post("/api/mentorat/binomes", &token, json!({ "mentor_id": kane, "mentore_id": lena })).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["statut"], "actif");
    let binome = id_of(&res)?;

    let res = app.get(&format!("/api/mentorat/mentores/{}", lena), &token).await?;
    assert_eq!(res.data()["statut"], "accompagne");

    // Mentor is full
    let res = app.post("/api/mentorat/binomes", &token, json!({ "mentor_id": kane, "mentore_id": omar })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    // Mentoré already paired
    let res = app.post("/api/mentorat/binomes", &token, json!({ "mentor_id": gueye, "mentore_id": lena })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.get(&format!("/api/mentorat/mentors/{}", kane), &token).await?;
    assert_eq!(res.data()["binomes_actifs"], 1);

    let res = app
        .put(&format!("/api/mentorat/binomes/{}/statut", binome), &token, json!({ "statut": "termine" }))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    assert!(res.data()["date_fin"].is_string());

    let res = app.get(&format!("/api/mentorat/mentores/{}", lena), &token).await?;
    assert_eq!(res.data()["statut"], "termine");

    let res = app.post("/api/mentorat/binomes", &token, json!({ "mentor_id": kane, "mentore_id": omar })).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    Ok(())
}

#[tokio::test]
async fn capacity_cannot_drop_below_active_pairings() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app
        .post(
            "/api/mentorat/mentors",
            &token,
            json!({ "prenom": "Seynabou", "nom": "Mbaye", "email": "seynabou@mentors.test", "capacite_max": 2 }),
        )
        .await?;
    let mentor = id_of(&res)?;
    for prenom in ["Ali", "Yacine"] {
        let id = mentore(&app, &token, prenom).await?;
        let res = app.post("/api/mentorat/binomes", &token, json!({ "mentor_id": mentor, "mentore_id": id })).await?;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let res = app.put(&format!("/api/mentorat/mentors/{}", mentor), &token, json!({ "capacite_max": 1 })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.put(&format!("/api/mentorat/mentors/{}", mentor), &token, json!({ "capacite_max": 3 })).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());

    let res = app.get("/api/mentorat/stats", &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["binomes_actifs"], 2);
    Ok(())
}
