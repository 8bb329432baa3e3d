//! Colors for the control surface.

use ratatui::style::Color;

use crate::service::ServiceState;

/// Color theme for the TUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Borders of focused panels, tab highlight
    pub primary: Color,
    /// Key hints, checked boxes
    pub secondary: Color,
    /// Section titles
    pub accent: Color,
    /// Console search matches
    pub highlight: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub background: Color,
    pub selected_bg: Color,
    pub border: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Rgb(99, 102, 241),     // Indigo
            secondary: Color::Rgb(16, 185, 129),   // Emerald
            accent: Color::Rgb(251, 146, 60),      // Orange
            highlight: Color::Rgb(250, 204, 21),   // Yellow
            text: Color::White,
            text_dim: Color::Rgb(156, 163, 175),   // Gray-400
            text_muted: Color::Rgb(107, 114, 128), // Gray-500
            background: Color::Reset,
            selected_bg: Color::Rgb(55, 65, 81),   // Gray-700
            border: Color::Rgb(75, 85, 99),        // Gray-600
            success: Color::Rgb(34, 197, 94),      // Green
            warning: Color::Rgb(234, 179, 8),      // Yellow
            error: Color::Rgb(239, 68, 68),        // Red
        }
    }
}

impl Theme {
    /// Badge color for a service state.
    pub fn state_color(&self, state: ServiceState) -> Color {
        match state {
            ServiceState::Running => self.success,
            ServiceState::Starting | ServiceState::Stopping => self.warning,
            ServiceState::Stopped => self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_colors() {
        let theme = Theme::default();
        assert_eq!(theme.state_color(ServiceState::Running), theme.success);
        assert_eq!(theme.state_color(ServiceState::Starting), theme.warning);
        assert_eq!(theme.state_color(ServiceState::Stopped), theme.error);
    }
}
