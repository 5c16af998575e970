pub mod frontend_handler;
