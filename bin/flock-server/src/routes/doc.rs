use crate::routes::admin;
use crate::routes::relay;
use crate::routes::swarm;
use crate::routes::v1;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "flock-server",
    description = "flock-server API",
    version = "0.1.0",
    contact(name = "flock-rs", url = "https://github.com/flock-rs/flock")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(swarm::SwarmApi::openapi());
    root.merge(relay::RelayApi::openapi());
    root.merge(v1::api_docs());
    root.merge(admin::api_docs());
    root
}
