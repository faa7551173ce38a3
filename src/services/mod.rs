//! Business logic services

pub mod bookings;
pub mod equipment;
pub mod notifications;
pub mod slots;
pub mod users;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Store, scheduling::Clock};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub equipment: equipment::EquipmentService,
    pub slots: slots::SlotsService,
    pub bookings: bookings::BookingsService,
    pub notifications: notifications::NotificationsService,
}

impl Services {
    /// Create all services on top of one storage backend
    pub fn new<S: Store>(store: Arc<S>, auth_config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let notifications = notifications::NotificationsService::new(store.clone(), clock.clone());
        let slots = slots::SlotsService::new(store.clone(), clock.clone());

        Self {
            users: users::UsersService::new(store.clone(), auth_config),
            equipment: equipment::EquipmentService::new(store.clone(), store.clone(), store.clone()),
            bookings: bookings::BookingsService::new(store, slots.clone(), notifications.clone(), clock),
            slots,
            notifications,
        }
    }
}
