use mongodb::Database;
use startup_deals_config::Settings;
use startup_deals_services::{
    AuthService, ClaimService,
    dao::{claim::ClaimDao, deal::DealDao, user::UserDao},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub deals: Arc<DealDao>,
    pub claims: Arc<ClaimService>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let deals = Arc::new(DealDao::new(&db));
        let claims = Arc::new(ClaimService::new(
            deals.clone(),
            Arc::new(ClaimDao::new(&db)),
            settings.claims.clone(),
        ));

        Self {
            db,
            settings,
            auth,
            users,
            deals,
            claims,
        }
    }
}
