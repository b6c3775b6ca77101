mod auth;
mod helpers;
mod lifecycle;
mod probe;
