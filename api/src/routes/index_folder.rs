pub mod index_folder_request;
pub mod index_folder_route;
