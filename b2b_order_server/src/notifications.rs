//! Email notifications.
//!
//! The engine publishes events when users register, ask for a password reset or place orders. The hooks created by
//! [`create_notification_handlers`] turn those events into [`EmailMessage`]s and hand them to a [`Mailer`].
//!
//! The server ships with [`LogMailer`], which writes every message to the log. Plug in a real transport by
//! implementing [`Mailer`].
use std::sync::Arc;

use b2b_order_engine::{
    events::{
        EventHandlers,
        EventHooks,
        OrderStateChangedEvent,
        OrdersPlacedEvent,
        PasswordResetRequestedEvent,
        UserRegisteredEvent,
    },
    order_objects::OrderSummary,
};
use futures::future::BoxFuture;
use log::*;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Could not send email. {0}")]
pub struct MailError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, message: EmailMessage) -> BoxFuture<'static, Result<(), MailError>>;
}

/// Writes outgoing messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: EmailMessage) -> BoxFuture<'static, Result<(), MailError>> {
        Box::pin(async move {
            info!("✉️ From: {} To: {} Subject: {}", message.from, message.to.join(", "), message.subject);
            debug!("✉️ {}", message.body);
            Ok(())
        })
    }
}

pub fn registration_email(from: &str, ev: &UserRegisteredEvent) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: vec![ev.email.clone()],
        subject: "Email confirmation key".to_string(),
        body: ev.token.clone(),
    }
}

pub fn password_reset_email(from: &str, ev: &PasswordResetRequestedEvent) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: vec![ev.email.clone()],
        subject: "Password reset key".to_string(),
        body: ev.token.clone(),
    }
}

fn order_details(order: &OrderSummary) -> String {
    order
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!("{}) {}:\n    {} pcs * {} = {}", i + 1, item.product_name, item.quantity, item.price, item.sum)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One message to the user who placed the orders and, if there are administrators, one to them, for every order.
pub fn orders_placed_emails(from: &str, ev: &OrdersPlacedEvent) -> Vec<EmailMessage> {
    let mut messages = Vec::with_capacity(ev.orders.len() * 2);
    for order in &ev.orders {
        let details = order_details(order);
        messages.push(EmailMessage {
            from: from.to_string(),
            to: vec![ev.user_email.clone()],
            subject: format!("Order #{} has been placed", order.id),
            body: format!(
                "Order #{}, buyer: {:?}, order total: {}\nOrder details:\n{details}",
                order.id, order.buyer_name, order.order_sum
            ),
        });
        if !ev.admin_emails.is_empty() {
            messages.push(EmailMessage {
                from: from.to_string(),
                to: ev.admin_emails.clone(),
                subject: format!("Order #{}, buyer: {}, state: {}", order.id, order.buyer_id, order.state),
                body: format!(
                    "Order #{}, buyer: {}, order total: {}\nOrder details:\n{details}",
                    order.id, order.buyer_id, order.order_sum
                ),
            });
        }
    }
    messages
}

async fn deliver(mailer: Arc<dyn Mailer>, messages: Vec<EmailMessage>) {
    for message in messages {
        let subject = message.subject.clone();
        if let Err(e) = mailer.send(message).await {
            error!("✉️ Could not send '{subject}'. {e}");
        }
    }
}

/// Builds the event handlers that send notification emails from `server_email`.
pub fn create_notification_handlers(
    buffer_size: usize,
    server_email: &str,
    mailer: Arc<dyn Mailer>,
) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let (from, m) = (server_email.to_string(), mailer.clone());
    hooks.on_user_registered(move |ev| {
        debug!("📬️ Sending email confirmation key to {}", ev.email);
        Box::pin(deliver(m.clone(), vec![registration_email(&from, &ev)]))
    });
    let (from, m) = (server_email.to_string(), mailer.clone());
    hooks.on_password_reset(move |ev| {
        debug!("📬️ Sending password reset key to {}", ev.email);
        Box::pin(deliver(m.clone(), vec![password_reset_email(&from, &ev)]))
    });
    let (from, m) = (server_email.to_string(), mailer);
    hooks.on_orders_placed(move |ev| {
        debug!("📬️ Sending notifications for {} placed orders", ev.orders.len());
        Box::pin(deliver(m.clone(), orders_placed_emails(&from, &ev)))
    });
    hooks.on_order_state_changed(|ev: OrderStateChangedEvent| {
        Box::pin(async move {
            info!(
                "📬️ Order #{} of buyer #{} moved from {} to {}",
                ev.order_id, ev.buyer_id, ev.old_state, ev.new_state
            );
        })
    });
    EventHandlers::new(buffer_size, hooks)
}
