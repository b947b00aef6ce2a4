mod countries;
mod health;
mod status;

pub use countries::{
    delete_country_handler, get_country_handler, list_countries_handler, refresh_handler,
    summary_image_handler,
};
pub use health::health_handler;
pub use status::status_handler;
