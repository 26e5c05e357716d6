//! Conversation texts and menu labels.
//!
//! Everything the bot says lives here so flows and tests refer to the same
//! labels.

use crate::store::UserRecord;

/// Welcome message sent when a conversation starts.
pub const CONVERSATION_AFTER_START: &str = "👋 Hi! Welcome to the shop!";

/// Notification sent once when a conversation expires or is stopped.
pub const CONVERSATION_EXPIRED: &str =
    "⏳ The conversation has expired. Send /start to open a new one.";

/// Acknowledgement sent to administrators.
pub const CONVERSATION_ADMIN_WELCOME: &str =
    "🛠 You are an administrator. The admin panel is not available yet.";

/// Main menu: start a new order.
pub const MENU_ORDER: &str = "🛒 Order";
/// Main menu: check the status of previous orders.
pub const MENU_ORDER_STATUS: &str = "🛍 Order status";
/// Main menu: top up the wallet.
pub const MENU_ADD_CREDIT: &str = "💵 Add credit";
/// Main menu: information about the bot.
pub const MENU_INFO: &str = "ℹ️ Info";

/// The main menu labels, in render order.
pub const USER_MENU_LABELS: [&str; 4] = [MENU_ORDER, MENU_ORDER_STATUS, MENU_ADD_CREDIT, MENU_INFO];

/// Reply for the order branch.
pub const ORDER_PLACEHOLDER: &str = "🛒 The product catalog is being stocked. Check back soon!";
/// Reply for the order-status branch.
pub const ORDER_STATUS_PLACEHOLDER: &str = "🛍 You have no orders yet.";
/// Reply for the add-credit branch.
pub const ADD_CREDIT_PLACEHOLDER: &str = "💵 Credit top-ups are not enabled yet.";
/// Reply for the info branch.
pub const BOT_INFO: &str =
    "ℹ️ This bot sells products directly over Telegram.\nOrders and payments are handled in-chat.";

/// Prompt shown above the main menu keyboard.
#[must_use]
pub fn open_user_menu(user: &UserRecord) -> String {
    format!("Hello {user}!\nWhat would you like to do?")
}
