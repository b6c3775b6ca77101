mod auth;
mod environment;
mod navigation;
