use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderStateChangedEvent,
    OrdersPlacedEvent,
    PasswordResetRequestedEvent,
    UserRegisteredEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub user_registered_producer: Vec<EventProducer<UserRegisteredEvent>>,
    pub password_reset_producer: Vec<EventProducer<PasswordResetRequestedEvent>>,
    pub orders_placed_producer: Vec<EventProducer<OrdersPlacedEvent>>,
    pub order_state_changed_producer: Vec<EventProducer<OrderStateChangedEvent>>,
}

pub struct EventHandlers {
    pub on_user_registered: Option<EventHandler<UserRegisteredEvent>>,
    pub on_password_reset: Option<EventHandler<PasswordResetRequestedEvent>>,
    pub on_orders_placed: Option<EventHandler<OrdersPlacedEvent>>,
    pub on_order_state_changed: Option<EventHandler<OrderStateChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_user_registered: hooks.on_user_registered.map(|f| EventHandler::new(buffer_size, f)),
            on_password_reset: hooks.on_password_reset.map(|f| EventHandler::new(buffer_size, f)),
            on_orders_placed: hooks.on_orders_placed.map(|f| EventHandler::new(buffer_size, f)),
            on_order_state_changed: hooks.on_order_state_changed.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_user_registered {
            result.user_registered_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_password_reset {
            result.password_reset_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_orders_placed {
            result.orders_placed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_state_changed {
            result.order_state_changed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for each configured handler. Each task ends once all of its producers are dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_user_registered {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_password_reset {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_orders_placed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_state_changed {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_user_registered: Option<Handler<UserRegisteredEvent>>,
    pub on_password_reset: Option<Handler<PasswordResetRequestedEvent>>,
    pub on_orders_placed: Option<Handler<OrdersPlacedEvent>>,
    pub on_order_state_changed: Option<Handler<OrderStateChangedEvent>>,
}

impl EventHooks {
    pub fn on_user_registered<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(UserRegisteredEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_user_registered = Some(Arc::new(f));
        self
    }

    pub fn on_password_reset<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PasswordResetRequestedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_password_reset = Some(Arc::new(f));
        self
    }

    pub fn on_orders_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrdersPlacedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_orders_placed = Some(Arc::new(f));
        self
    }

    pub fn on_order_state_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStateChangedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_state_changed = Some(Arc::new(f));
        self
    }
}
