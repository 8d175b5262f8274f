pub mod email_service;
