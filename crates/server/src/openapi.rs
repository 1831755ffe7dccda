use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub ok: bool }

#[derive(ToSchema)]
pub struct ProviderDoc {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub specialties: Vec<String>,
}

#[derive(ToSchema)]
pub struct ProviderPageDoc {
    pub items: Vec<ProviderDoc>,
    /// Matches across all pages
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct ErrorDoc {
    pub statusCode: u16,
    pub error: String,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Psych API", version = "1.0.0"),
    paths(
        crate::routes::health,
        crate::routes::providers::list,
        crate::routes::providers::get,
    ),
    components(
        schemas(
            HealthResponse,
            ProviderDoc,
            ProviderPageDoc,
            ErrorDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "providers")
    )
)]
pub struct ApiDoc;
