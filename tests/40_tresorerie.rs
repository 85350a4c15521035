mod common;

use std::str::FromStr;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use asso_admin_api::models::adhesion::MemberStatus;
use asso_admin_api::models::admin::{Droit, ModuleName};

use common::{id_of, TestApp};

fn decimal(value: &Value) -> Result<Decimal> {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Decimal::from_str(&raw).with_context(|| format!("not a decimal: {}", value))
}

#[tokio::test]
async fn bilan_converts_xof_and_counts_only_validated_rows() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.admin_with("tresorier@asso.test", &[(ModuleName::Tresorerie, Droit::Ecriture)]).await?;
    let dakar = app.seed_member("Moussa", "Sarr", Some("Sénégal"), MemberStatus::Approved).await?;
    let paris = app.seed_member("Claire", "Martin", Some("France"), MemberStatus::Approved).await?;

    // Currency follows the member's country when omitted
    let res = app
        .post(
            "/api/tresorerie/cotisations",
            &token,
            json!({ "membre_id": dakar.id, "annee": 2025, "montant": "6559.57" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["devise"], "XOF");
    assert_eq!(res.data()["statut"], "en_attente");
    let xof_id = id_of(&res)?;

    let res = app
        .post("/api/tresorerie/cotisations", &token, json!({ "membre_id": paris.id, "annee": 2025, "montant": "25" }))
        .await?;
    assert_eq!(res.data()["devise"], "EUR");
    let pending_id = id_of(&res)?;

    let res = app.post(&format!("/api/tresorerie/cotisations/{}/validate", xof_id), &token, json!({})).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    assert_eq!(res.data()["statut"], "validee");

    let res = app
        .post(
            "/api/tresorerie/depenses",
            &token,
            json!({ "libelle": "Hébergement du site", "montant": "4", "devise": "EUR", "date_depense": "2025-03-10" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    let depense_id = id_of(&res)?;
    app.post(&format!("/api/tresorerie/depenses/{}/validate", depense_id), &token, json!({})).await?;

    let res = app
        .post(
            "/api/tresorerie/paiements",
            &token,
            json!({ "objet": "Don", "montant": "100", "devise": "EUR", "date_paiement": "2025-06-01" }),
        )
        .await?;
    let rejected_id = id_of(&res)?;
    let res = app.post(&format!("/api/tresorerie/paiements/{}/reject", rejected_id), &token, json!({})).await?;
    assert_eq!(res.data()["statut"], "rejete");

    let res = app.get("/api/tresorerie/bilan?annee=2025", &token).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    let bilan = res.data();
    assert_eq!(decimal(&bilan["total_cotisations_eur"])?, Decimal::from_str("10.00")?);
    assert_eq!(decimal(&bilan["total_depenses_eur"])?, Decimal::from_str("4")?);
    assert_eq!(decimal(&bilan["total_paiements_eur"])?, Decimal::ZERO);
    assert_eq!(decimal(&bilan["solde_eur"])?, Decimal::from_str("6.00")?);
    assert_eq!(bilan["cotisations"]["en_attente"], 1);
    assert_eq!(bilan["cotisations"]["valides"], 1);
    assert_eq!(bilan["paiements"]["rejetes"], 1);
    assert_eq!(bilan["mensuel"].as_array().map(Vec::len), Some(12));
    assert_eq!(decimal(&bilan["mensuel"][2]["depenses_eur"])?, Decimal::from_str("4")?);

    let res = app.get(&format!("/api/tresorerie/cotisations/{}", pending_id), &token).await?;
    assert_eq!(res.data()["statut"], "en_attente");
    Ok(())
}

#[tokio::test]
async fn ledger_transitions_only_leave_en_attente() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;
    let membre = app.seed_member("Ibrahima", "Ndiaye", Some("France"), MemberStatus::Approved).await?;

    let res = app
        .post("/api/tresorerie/cotisations", &token, json!({ "membre_id": membre.id, "annee": 2025, "montant": "30" }))
        .await?;
    let id = id_of(&res)?;

    let res = app.post(&format!("/api/tresorerie/cotisations/{}/validate", id), &token, json!({})).await?;
    assert_eq!(res.status, StatusCode::OK);

    for action in ["validate", "cancel"] {
        let res = app.post(&format!("/api/tresorerie/cotisations/{}/{}", id, action), &token, json!({})).await?;
        assert_eq!(res.status, StatusCode::CONFLICT, "{}", action);
    }

    let res = app.delete(&format!("/api/tresorerie/cotisations/{}", id), &token).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.post(&format!("/api/tresorerie/cotisations/{}/reset", id), &token, json!({})).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.data()["validated_at"].is_null());

    let res = app.delete(&format!("/api/tresorerie/cotisations/{}", id), &token).await?;
    assert_eq!(res.status, StatusCode::OK);

    // create, validate, reset, delete
    let res = app.get(&format!("/api/tresorerie/historique?entity_id={}", id), &token).await?;
    assert_eq!(res.json()["pagination"]["total"], 4, "{}", res.json());
    Ok(())
}

#[tokio::test]
async fn amounts_must_be_positive() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app.post("/api/tresorerie/depenses", &token, json!({ "libelle": "Erreur", "montant": "0" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["errors"][0]["field"], "montant");
    Ok(())
}

#[tokio::test]
async fn one_active_card_per_member_and_year() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;
    let approved = app.seed_member("Mariama", "Cissé", None, MemberStatus::Approved).await?;
    let pending = app.seed_member("Paul", "Durand", None, MemberStatus::Pending).await?;

    let res = app.post("/api/tresorerie/cartes", &token, json!({ "membre_id": pending.id, "annee": 2025 })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.post("/api/tresorerie/cartes", &token, json!({ "membre_id": approved.id, "annee": 2025 })).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json());
    assert_eq!(res.data()["date_expiration"], "2025-12-31");
    let carte_id = id_of(&res)?;

    let res = app.post("/api/tresorerie/cartes", &token, json!({ "membre_id": approved.id, "annee": 2025 })).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.post(&format!("/api/tresorerie/cartes/{}/cancel", carte_id), &token, json!({})).await?;
    assert_eq!(res.data()["statut"], "annulee");

    let res = app.post("/api/tresorerie/cartes", &token, json!({ "membre_id": approved.id, "annee": 2025 })).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_ne!(id_of(&res)?, carte_id);
    Ok(())
}

#[tokio::test]
async fn treasury_actions_are_audited() -> Result<()> {
    let app = TestApp::new();
    let (admin, token) = app.master().await?;

    let res = app
        .post("/api/tresorerie/paiements", &token, json!({ "objet": "Vente de t-shirts", "montant": "45.50", "devise": "EUR" }))
        .await?;
    let id = id_of(&res)?;
    app.post(&format!("/api/tresorerie/paiements/{}/validate", id), &token, json!({})).await?;
    app.state.effects.flush().await;

    let res = app.get(&format!("/api/audit?entity_id={}", id), &token).await?;
    let entries = res.data();
    let mut actions: Vec<String> = entries
        .as_array()
        .map(|list| list.iter().filter_map(|e| e["action_type"].as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    actions.sort();
    assert_eq!(actions, vec!["create", "validate"]);
    assert!(entries.as_array().is_some_and(|list| list.iter().all(|e| e["admin_email"] == admin.email.as_str())));

    let validated = entries
        .as_array()
        .and_then(|list| list.iter().find(|e| e["action_type"] == "validate"))
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(validated["before"]["statut"], "en_attente");
    assert_eq!(validated["after"]["statut"], "valide");
    Ok(())
}
