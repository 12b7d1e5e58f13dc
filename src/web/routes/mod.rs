pub mod structure_routes;
