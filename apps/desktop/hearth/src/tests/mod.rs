mod commands;
mod frontend;
mod logger;
mod window;
