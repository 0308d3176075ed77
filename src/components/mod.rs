pub mod sidebar;
pub mod theme_toggle;
