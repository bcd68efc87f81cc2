//! Shared UI icons.
//!
//! Each icon carries an ASCII fallback for terminals without emoji support.

use console::Emoji;

// Phase status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static RUNNING: Emoji<'_, '_> = Emoji("▶️  ", "[>]");
pub static PENDING: Emoji<'_, '_> = Emoji("⏳ ", "[ ]");

// Overall indicators
pub static PROGRESS: Emoji<'_, '_> = Emoji("📊 ", "[PROG]");
pub static STAGE: Emoji<'_, '_> = Emoji("🔎 ", "[S]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
