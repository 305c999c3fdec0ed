pub mod domain {
    pub mod logger;
    pub mod settings;
    pub mod trace;
}
