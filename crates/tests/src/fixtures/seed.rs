use bson::{doc, oid::ObjectId};
use serde_json::{Value, json};

use super::test_app::TestApp;

pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl SeededUser {
    pub fn object_id(&self) -> ObjectId {
        ObjectId::parse_str(&self.id).unwrap()
    }
}

/// A valid deal body; tweak fields on the returned value as needed.
pub fn deal_body(title: &str, access_level: &str, requires_verification: bool) -> Value {
    json!({
        "title": title,
        "description": format!("{title} for early-stage startups"),
        "shortDescription": format!("{title} discount"),
        "partner": { "name": "Partner Inc", "website": "https://partner.example" },
        "category": "cloud",
        "accessLevel": access_level,
        "eligibilityConditions": {
            "requiresVerification": requires_verification,
            "requirements": ["Less than 2 years old"],
        },
        "benefits": ["Credits", "Support"],
        "discountValue": "$1,000 in credits",
        "tags": ["cloud"],
    })
}

impl TestApp {
    /// Register a user and return their auth info.
    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Register request failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse register response");
        assert_eq!(status, 201, "Register failed: {json}");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            token: json["token"].as_str().unwrap().to_string(),
        }
    }

    /// Role and verification are set directly in the database; there is no
    /// HTTP route that grants them.
    pub async fn set_role(&self, user: &SeededUser, role: &str, is_verified: bool) {
        self.db
            .collection::<bson::Document>("users")
            .update_one(
                doc! { "_id": user.object_id() },
                doc! { "$set": { "role": role, "is_verified": is_verified } },
            )
            .await
            .expect("Failed to update user role");
    }

    pub async fn seed_admin(&self) -> SeededUser {
        let admin = self
            .register_user("Admin", "admin@deals.test", "Admin123!")
            .await;
        self.set_role(&admin, "admin", true).await;
        admin
    }

    pub async fn seed_verified_user(&self, email: &str) -> SeededUser {
        let user = self.register_user("Verified Founder", email, "Founder123!").await;
        self.set_role(&user, "verified", true).await;
        user
    }

    /// Create a deal through the API and return its id.
    pub async fn create_deal(&self, admin_token: &str, body: &Value) -> String {
        let resp = self
            .auth_post("/api/deals", admin_token)
            .json(body)
            .send()
            .await
            .expect("Create deal failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.unwrap();
        assert_eq!(status, 201, "Create deal failed: {json}");
        json["deal"]["id"].as_str().unwrap().to_string()
    }

    pub async fn get_deal(&self, deal_id: &str) -> Value {
        let resp = self
            .client
            .get(self.url(&format!("/api/deals/{deal_id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let json: Value = resp.json().await.unwrap();
        json["deal"].clone()
    }

    pub async fn claim(&self, token: &str, deal_id: &str) -> reqwest::Response {
        self.auth_post("/api/claims", token)
            .json(&json!({ "dealId": deal_id }))
            .send()
            .await
            .unwrap()
    }

    /// Create an authenticated request with the given token.
    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }
}
