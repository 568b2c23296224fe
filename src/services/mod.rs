//! Business logic services

pub mod availability;
pub mod bookings;
pub mod clock;
pub mod items;
pub mod users;

use std::sync::Arc;

use crate::repository::Repository;

use self::clock::Clock;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub items: items::ItemsService,
    pub bookings: bookings::BookingsService,
}

impl Services {
    /// Create all services over one repository and one source of time
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: users::UsersService::new(repository.clone()),
            items: items::ItemsService::new(repository.clone(), clock.clone()),
            bookings: bookings::BookingsService::new(repository, clock),
        }
    }
}
