pub mod upload_response;
pub mod upload_route;
