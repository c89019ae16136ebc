pub mod help_overlay;
pub mod legend;
pub mod map_view;
pub mod order_form;
pub mod status_banner;
