pub mod structure_service;
