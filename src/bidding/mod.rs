pub mod commands;
pub mod serializer;
pub mod validator;
