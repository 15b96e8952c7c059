use axum::Router;

pub async fn create_test_app() -> Router {
    std::env::set_var("DATABASE_URL", "");
    std::env::set_var("ENABLE_FILE_LOGS", "false");

    satprep_backend::create_app().await
}
