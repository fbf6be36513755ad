use std::cell::Cell;

/// Hands out serials for events which a client may later refer back to.
///
/// Serials are never zero so zero can mean "no serial".
#[derive(Debug, Default)]
pub struct Serials(Cell<u32>);

impl Serials {
    pub fn next(&self) -> u32 {
        let serial = match self.0.get().wrapping_add(1) {
            0 => 1,
            serial => serial,
        };

        self.0.set(serial);
        serial
    }
}

#[cfg(test)]
mod tests {
    use super::Serials;

    #[test]
    fn skips_zero_on_wrap() {
        let serials = Serials::default();
        serials.0.set(u32::MAX - 1);

        assert_eq!(serials.next(), u32::MAX);
        assert_eq!(serials.next(), 1);
    }
}
