//! Polled, debounced button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The main loop samples the
//! level every iteration; a level change is accepted only after it has
//! been stable for the debounce window, and is reported once as a
//! [`ButtonEdge`].  Gesture classification (short / long) lives in the
//! menu machine, which needs the edges and the hold duration.

use crate::menu::ButtonEdge;

pub struct ButtonDriver {
    gpio: i32,
    debounce_ms: u32,
    stable_pressed: bool,
    candidate: Option<(bool, u32)>,
}

impl ButtonDriver {
    pub fn new(gpio: i32, debounce_ms: u32) -> Self {
        Self {
            gpio,
            debounce_ms,
            stable_pressed: false,
            candidate: None,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    pub fn is_pressed(&self) -> bool {
        self.stable_pressed
    }

    /// Sample the pin and run the debouncer.
    pub fn poll(&mut self, now_ms: u32) -> Option<ButtonEdge> {
        let pressed = !crate::drivers::hw_init::gpio_read(self.gpio);
        self.update(pressed, now_ms)
    }

    /// Feed one raw level sample.  Returns an edge once the new level has
    /// held for `debounce_ms`.
    pub fn update(&mut self, pressed: bool, now_ms: u32) -> Option<ButtonEdge> {
        if pressed == self.stable_pressed {
            self.candidate = None;
            return None;
        }

        match self.candidate {
            Some((level, since)) if level == pressed => {
                if now_ms.wrapping_sub(since) >= self.debounce_ms {
                    self.stable_pressed = pressed;
                    self.candidate = None;
                    Some(if pressed {
                        ButtonEdge::Pressed
                    } else {
                        ButtonEdge::Released
                    })
                } else {
                    None
                }
            }
            _ => {
                self.candidate = Some((pressed, now_ms));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_events_without_press() {
        let mut btn = ButtonDriver::new(14, 50);
        assert_eq!(btn.update(false, 100), None);
        assert_eq!(btn.update(false, 200), None);
    }

    #[test]
    fn debounce_filters_rapid_noise() {
        let mut btn = ButtonDriver::new(14, 50);
        assert_eq!(btn.update(true, 100), None);
        assert_eq!(btn.update(false, 120), None); // bounce resets
        assert_eq!(btn.update(true, 130), None);
        assert_eq!(btn.update(true, 170), None); // 40ms stable
        assert_eq!(btn.update(true, 180), Some(ButtonEdge::Pressed));
        assert!(btn.is_pressed());
    }

    #[test]
    fn release_is_reported_once() {
        let mut btn = ButtonDriver::new(14, 50);
        btn.update(true, 0);
        btn.update(true, 50);
        assert_eq!(btn.update(false, 1000), None);
        assert_eq!(btn.update(false, 1050), Some(ButtonEdge::Released));
        assert_eq!(btn.update(false, 1100), None);
    }

    #[test]
    fn host_pin_reads_released() {
        let mut btn = ButtonDriver::new(14, 50);
        assert_eq!(btn.poll(0), None);
        assert_eq!(btn.poll(100), None);
        assert!(!btn.is_pressed());
    }
}
