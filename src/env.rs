lazy_static::lazy_static! {
    /// Host name the web server binds to.
    ///
    /// Field name: `HOST`
    pub static ref HOST: String = std::env::var("HOST").unwrap_or_else(|_| "localhost".to_owned());

    /// The application port.
    ///
    /// Field name: `HTTP_PORT`
    pub static ref HTTP_PORT: u16 = std::env::var("HTTP_PORT")
        .unwrap_or_else(|_| "".to_string())
        .parse::<u16>()
        .unwrap_or(8080);

    /// Database connection string.
    ///
    /// Field name: `DATABASE_URI`
    pub static ref DATABASE_URI: String = std::env::var("DATABASE_URI").expect("DATABASE_URI must be set");

    /// Storage path for uploaded loan documents and payment proof images.
    ///
    /// Field name: `UPLOAD_STORAGE`
    pub static ref UPLOAD_STORAGE: String = std::env::var("UPLOAD_STORAGE").unwrap_or_else(|_| "./uploads".to_owned());

    /// Salt for password hashing.
    ///
    /// Field name: `PASSWORD_SALT`
    pub static ref PASSWORD_SALT: String = std::env::var("PASSWORD_SALT").unwrap_or_else(|_| "0123012301230123".repeat(8));

    /// Base url of the external payment gateway.
    ///
    /// Field name: `PAYMENT_GATEWAY_URL`
    pub static ref PAYMENT_GATEWAY_URL: String = std::env::var("PAYMENT_GATEWAY_URL").unwrap_or_else(|_| "https://gateway.example.local".to_owned());

    /// Api key for the external payment gateway.
    ///
    /// Field name: `PAYMENT_GATEWAY_KEY`
    pub static ref PAYMENT_GATEWAY_KEY: String = std::env::var("PAYMENT_GATEWAY_KEY").unwrap_or_else(|_| "".to_owned());
}
