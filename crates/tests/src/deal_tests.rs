use crate::fixtures::{seed::deal_body, test_app::TestApp};
use serde_json::{Value, json};

#[tokio::test]
async fn empty_catalog_lists_nothing() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/api/deals")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 0);
    assert_eq!(json["deals"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn admin_creates_deal_with_defaults() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;

    let mut body = deal_body("Notion Team Plan", "public", false);
    body.as_object_mut().unwrap().remove("accessLevel");

    let resp = app
        .auth_post("/api/deals", &admin.token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Deal created successfully");
    let deal = &json["deal"];
    assert_eq!(deal["title"], "Notion Team Plan");
    assert_eq!(deal["accessLevel"], "public");
    assert_eq!(deal["claimCount"], 0);
    assert_eq!(deal["isActive"], true);
    assert_eq!(deal["isAvailable"], true);
    assert_eq!(deal["partner"]["name"], "Partner Inc");
    assert!(deal["id"].is_string());
}

#[tokio::test]
async fn non_admin_cannot_create_deal() {
    let app = TestApp::spawn().await;
    let user = app
        .register_user("Founder", "founder@startup.io", "Password123!")
        .await;
    let body = deal_body("Sneaky Deal", "public", false);

    let resp = app
        .auth_post("/api/deals", &user.token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Verified is still below admin
    app.set_role(&user, "verified", true).await;
    let resp = app
        .auth_post("/api/deals", &user.token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .client
        .post(app.url("/api/deals"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn invalid_deal_reports_fields() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;

    let resp = app
        .auth_post("/api/deals", &admin.token)
        .json(&json!({
            "title": "AB",
            "description": "short",
            "shortDescription": "ok",
            "partner": { "name": "" },
            "category": "crypto",
            "claimLimit": 0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let json: Value = resp.json().await.unwrap();
    let errors = &json["errors"];
    assert!(errors["title"].is_array());
    assert!(errors["description"].is_array());
    assert!(errors["category"].is_array());
    assert!(errors["partner.name"].is_array());
    assert!(errors["claimLimit"].is_array());
}

#[tokio::test]
async fn get_deal_by_id() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;
    let id = app
        .create_deal(&admin.token, &deal_body("Figma Professional", "public", false))
        .await;

    let deal = app.get_deal(&id).await;
    assert_eq!(deal["id"], id.as_str());
    assert_eq!(deal["title"], "Figma Professional");

    let resp = app
        .client
        .get(app.url("/api/deals/64b000000000000000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Deal not found");

    let resp = app
        .client
        .get(app.url("/api/deals/not-an-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn list_filters_by_category_and_access_level() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;

    let mut design = deal_body("Figma Professional", "public", false);
    design["category"] = json!("design");
    app.create_deal(&admin.token, &design).await;
    app.create_deal(&admin.token, &deal_body("AWS Activate", "locked", true))
        .await;
    app.create_deal(&admin.token, &deal_body("Google Cloud", "public", false))
        .await;

    let list = |query: &'static str| {
        let url = app.url(&format!("/api/deals{query}"));
        let client = app.client.clone();
        async move {
            let json: Value = client.get(url).send().await.unwrap().json().await.unwrap();
            json
        }
    };

    assert_eq!(list("").await["count"], 3);
    assert_eq!(list("?category=all&accessLevel=all").await["count"], 3);
    assert_eq!(list("?category=cloud").await["count"], 2);
    assert_eq!(list("?accessLevel=locked").await["count"], 1);
    assert_eq!(list("?category=cloud&accessLevel=public").await["count"], 1);

    let json = list("?category=design").await;
    assert_eq!(json["deals"][0]["title"], "Figma Professional");

    // Unknown values are exact matches that hit nothing
    let resp = app
        .client
        .get(app.url("/api/deals?category=crypto"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["count"], 0);
    assert_eq!(json["deals"].as_array().unwrap().len(), 0);

    assert_eq!(list("?accessLevel=vip").await["count"], 0);
}

#[tokio::test]
async fn list_searches_text_and_hides_inactive() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;

    app.create_deal(&admin.token, &deal_body("HubSpot Marketing", "public", false))
        .await;
    app.create_deal(&admin.token, &deal_body("Segment Analytics", "public", false))
        .await;
    let mut retired = deal_body("Retired HubSpot Offer", "public", false);
    retired["isActive"] = json!(false);
    let retired_id = app.create_deal(&admin.token, &retired).await;

    let json: Value = app
        .client
        .get(app.url("/api/deals?search=hubspot"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["deals"][0]["title"], "HubSpot Marketing");

    // Still reachable directly, but reported unavailable
    let deal = app.get_deal(&retired_id).await;
    assert_eq!(deal["isActive"], false);
    assert_eq!(deal["isAvailable"], false);
}

#[tokio::test]
async fn list_sorts_by_popularity() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;

    let quiet = app
        .create_deal(&admin.token, &deal_body("Quiet Deal", "public", false))
        .await;
    // created_at has millisecond resolution
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let popular = app
        .create_deal(&admin.token, &deal_body("Popular Deal", "public", false))
        .await;

    for n in 0..2 {
        let user = app
            .register_user("Claimer", &format!("claimer{n}@startup.io"), "Password123!")
            .await;
        assert_eq!(app.claim(&user.token, &popular).await.status().as_u16(), 201);
    }

    let json: Value = app
        .client
        .get(app.url("/api/deals?sort=popular"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["deals"][0]["id"], popular.as_str());
    assert_eq!(json["deals"][0]["claimCount"], 2);
    assert_eq!(json["deals"][1]["id"], quiet.as_str());

    let json: Value = app
        .client
        .get(app.url("/api/deals?sort=oldest"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["deals"][0]["id"], quiet.as_str());
}

#[tokio::test]
async fn expired_deal_is_listed_but_unavailable() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;

    let mut body = deal_body("Last Year's Offer", "public", false);
    body["validUntil"] = json!("2020-01-01T00:00:00Z");
    let id = app.create_deal(&admin.token, &body).await;

    let deal = app.get_deal(&id).await;
    assert_eq!(deal["isActive"], true);
    assert_eq!(deal["isAvailable"], false);
    assert!(deal["validUntil"].as_str().unwrap().starts_with("2020-01-01"));
}
