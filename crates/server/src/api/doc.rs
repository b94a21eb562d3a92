//! OpenAPI document, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "mindmap API",
        version = "0.1.0",
        description = "Turns a prompt, a PDF and an audio clip into an LLM-generated mind map.",
    ),
    tags(
        (name = "Health", description = "Server readiness and backend inventory"),
        (name = "Mindmap", description = "File processing and mind-map generation"),
    ),
    paths(
        crate::api::health::health,
        crate::api::process::process_file,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::HealthResponse,
        crate::pipeline::ProcessResponse,
        crate::pipeline::SkippedChunkReport,
        crate::pipeline::Pass,
    ))
)]
pub struct ApiDoc;
