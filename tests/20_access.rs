mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use asso_admin_api::models::admin::{Droit, ModuleName};

use common::{id_of, token_for, TestApp, PASSWORD};

#[tokio::test]
async fn module_without_grant_is_forbidden() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.admin_with("formateur@asso.test", &[(ModuleName::Formation, Droit::Ecriture)]).await?;

    let res = app.get("/api/formation/formations", &token).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.get("/api/tresorerie/bilan", &token).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json()["success"], false);
    Ok(())
}

#[tokio::test]
async fn lecture_grant_is_read_only() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.admin_with("lecteur@asso.test", &[(ModuleName::Mentorat, Droit::Lecture)]).await?;

    let res = app.get("/api/mentorat/mentors", &token).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .post("/api/mentorat/mentors", &token, json!({ "prenom": "Awa", "nom": "Ndiaye", "email": "awa@mentor.test" }))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_management_is_master_only() -> Result<()> {
    let app = TestApp::new();
    let (_, plain) = app
        .admin_with("plain@asso.test", &[(ModuleName::Adhesion, Droit::Admin)])
        .await?;
    let (_, master) = app.master().await?;

    for uri in ["/api/admins", "/api/audit"] {
        let res = app.get(uri, &plain).await?;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{}", uri);
        let res = app.get(uri, &master).await?;
        assert_eq!(res.status, StatusCode::OK, "{}", uri);
    }
    Ok(())
}

#[tokio::test]
async fn created_admin_logs_in_with_its_grants() -> Result<()> {
    let app = TestApp::new();
    let (_, master) = app.master().await?;

    let res = app
        .post(
            "/api/admins",
            &master,
            json!({
                "email": "Tresoriere@Asso.test",
                "password": PASSWORD,
                "prenom": "Fatou",
                "nom": "Sow",
                "modules": [{ "module": "tresorerie", "droit": "ecriture" }]
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["email"], "tresoriere@asso.test");
    assert_eq!(res.data()["modules"][0]["module"], "tresorerie");

    let res = app
        .public_post("/api/auth/login", json!({ "email": "tresoriere@asso.test", "password": PASSWORD }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let modules = res.data()["modules"].clone();
    assert_eq!(modules, json!([{ "module": "tresorerie", "droit": "ecriture" }]));

    let res = app
        .post(
            "/api/admins",
            &master,
            json!({ "email": "tresoriere@asso.test", "password": PASSWORD, "prenom": "F", "nom": "S" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn master_cannot_deactivate_itself() -> Result<()> {
    let app = TestApp::new();
    let (master, token) = app.master().await?;

    let res = app.delete(&format!("/api/admins/{}", master.id), &token).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.put(&format!("/api/admins/{}", master.id), &token, json!({ "is_master": false })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn replacing_grants_takes_effect_on_next_request() -> Result<()> {
    let app = TestApp::new();
    let (_, master) = app.master().await?;
    let (admin, token) = app.admin_with("mobile@asso.test", &[(ModuleName::Webinaire, Droit::Admin)]).await?;

    let res = app.get("/api/recrutement/offres", &token).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .put(
            &format!("/api/admins/{}/modules", admin.id),
            &master,
            json!([{ "module": "recrutement", "droit": "lecture" }]),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());

    let res = app.get("/api/recrutement/offres", &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.get("/api/webinaire/webinaires", &token).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn deactivated_admin_token_stops_working() -> Result<()> {
    let app = TestApp::new();
    let (_, master) = app.master().await?;
    let (admin, _) = app.admin_with("sortant@asso.test", &[(ModuleName::Adhesion, Droit::Admin)]).await?;
    let token = token_for(&admin)?;

    let res = app.delete(&format!("/api/admins/{}", admin.id), &master).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    assert_eq!(res.data()["is_active"], false);

    let res = app.get("/api/adhesion/membres", &token).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn bad_pagination_is_a_field_error() -> Result<()> {
    let app = TestApp::new();
    let (_, master) = app.master().await?;

    let res = app.get("/api/adhesion/membres?page=0&limit=9999", &master).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let fields: Vec<String> = res.json()["errors"]
        .as_array()
        .map(|errors| errors.iter().filter_map(|e| e["field"].as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    assert_eq!(fields, vec!["page".to_string(), "limit".to_string()]);

    let res = app.get("/api/secretariat/reunions?page=9223372036854775807&limit=500", &master).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["errors"][0]["field"], "page");

    let res = app.get("/api/adhesion/membres?page=2&limit=5", &master).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["pagination"]["page"], 2);
    assert_eq!(res.json()["pagination"]["limit"], 5);
    Ok(())
}

#[tokio::test]
async fn audit_log_records_admin_actions() -> Result<()> {
    let app = TestApp::new();
    let (master, token) = app.master().await?;

    let res = app
        .post(
            "/api/recrutement/offres",
            &token,
            json!({ "titre": "Chargé de communication", "type_contrat": "benevolat" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let offre_id = id_of(&res)?;
    app.state.effects.flush().await;

    let res = app.get(&format!("/api/audit?entity_type=offre&entity_id={}", offre_id), &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    let entries = res.data();
    assert_eq!(entries.as_array().map(Vec::len), Some(1), "{}", entries);
    assert_eq!(entries[0]["action_type"], "create");
    assert_eq!(entries[0]["admin_id"], master.id.to_string());
    assert!(entries[0]["before"].is_null());
    assert_eq!(entries[0]["after"]["titre"], "Chargé de communication");
    Ok(())
}
