use core::fmt;

/// The board variants this loader knows how to drive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoardVariant {
    RaspberryPiB,
    RaspberryPiBPlus,
    RaspberryPi2,
}

/// Static facts about one board variant.
#[derive(Debug, PartialEq, Eq)]
pub struct BoardInfo {
    /// Human readable model name.
    pub model: &'static str,
    /// Physical base address of the memory mapped peripherals.
    pub io_base: usize,
    /// GPIO driving the activity LED.
    pub led_gpio: u8,
    /// Whether the LED lights up when the GPIO is driven low.
    pub led_active_low: bool,
}

static PI_B: BoardInfo = BoardInfo {
    model: "Raspberry Pi b",
    io_base: 0x2000_0000,
    led_gpio: 16,
    led_active_low: true,
};

static PI_B_PLUS: BoardInfo = BoardInfo {
    model: "Raspberry Pi b+",
    io_base: 0x2000_0000,
    led_gpio: 47,
    led_active_low: false,
};

static PI_2: BoardInfo = BoardInfo {
    model: "Raspberry Pi b 2",
    io_base: 0x3F00_0000,
    led_gpio: 47,
    led_active_low: false,
};

/// Command line fragments the firmware emits, in the order they are tested.
/// A later match overrides an earlier one.
const CMDLINE_MARKERS: [(&str, BoardVariant); 2] = [
    ("bcm2708.disk_led_gpio=47", BoardVariant::RaspberryPiBPlus),
    ("bcm2709.disk_led_gpio=47", BoardVariant::RaspberryPi2),
];

impl BoardVariant {
    /// Classifies the board from the kernel command line the firmware
    /// passed in. Falls back to `RaspberryPiB` when nothing matches.
    pub fn from_cmdline(cmdline: &str) -> BoardVariant {
        let mut variant = BoardVariant::RaspberryPiB;
        for (marker, candidate) in CMDLINE_MARKERS.iter() {
            if cmdline.contains(marker) {
                variant = *candidate;
            }
        }
        variant
    }

    pub fn info(self) -> &'static BoardInfo {
        match self {
            BoardVariant::RaspberryPiB => &PI_B,
            BoardVariant::RaspberryPiBPlus => &PI_B_PLUS,
            BoardVariant::RaspberryPi2 => &PI_2,
        }
    }
}

/// The resolved board descriptor. Built once at entry and passed by
/// reference from then on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Board {
    variant: BoardVariant,
    info: &'static BoardInfo,
}

impl Board {
    pub fn identify(cmdline: &str) -> Board {
        Board::from(BoardVariant::from_cmdline(cmdline))
    }

    pub fn variant(&self) -> BoardVariant {
        self.variant
    }

    pub fn model(&self) -> &'static str {
        self.info.model
    }

    pub fn io_base(&self) -> usize {
        self.info.io_base
    }

    pub fn led_gpio(&self) -> u8 {
        self.info.led_gpio
    }

    pub fn led_active_low(&self) -> bool {
        self.info.led_active_low
    }
}

impl From<BoardVariant> for Board {
    fn from(variant: BoardVariant) -> Board {
        Board { variant, info: variant.info() }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (io @ {:#010x}, led gpio {})", self.model(), self.io_base(), self.led_gpio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PI2_CMDLINE: &str = "dma.dmachans=0x7f35 bcm2709.boardrev=0xa21041 \
        bcm2709.serial=0x1c0d3f4 \
        smsc95xx.macaddr=B8:27:EB:C0:D3:F4 bcm2708_fb.fbswap=1 bcm2709.disk_led_gpio=47 \
        bcm2709.disk_led_activelow=0 vc_mem.mem_base=0x3dc00000 console=ttyAMA0,115200";

    #[test]
    fn empty_cmdline_is_baseline() {
        assert_eq!(BoardVariant::from_cmdline(""), BoardVariant::RaspberryPiB);
        assert_eq!(Board::identify("").model(), "Raspberry Pi b");
    }

    #[test]
    fn b_plus_marker() {
        let board = Board::identify("bcm2708.boardrev=0x10 bcm2708.disk_led_gpio=47 console=tty1");
        assert_eq!(board.variant(), BoardVariant::RaspberryPiBPlus);
        assert_eq!(board.io_base(), 0x2000_0000);
        assert_eq!(board.led_gpio(), 47);
        assert!(!board.led_active_low());
    }

    #[test]
    fn pi2_from_real_cmdline() {
        let board = Board::identify(PI2_CMDLINE);
        assert_eq!(board.variant(), BoardVariant::RaspberryPi2);
        assert_eq!(board.io_base(), 0x3F00_0000);
    }

    #[test]
    fn last_match_wins() {
        let cmdline = "bcm2709.disk_led_gpio=47 bcm2708.disk_led_gpio=47";
        assert_eq!(BoardVariant::from_cmdline(cmdline), BoardVariant::RaspberryPi2);
    }

    #[test]
    fn matching_is_case_sensitive_and_exact() {
        let pi_b = BoardVariant::RaspberryPiB;
        assert_eq!(BoardVariant::from_cmdline("BCM2709.DISK_LED_GPIO=47"), pi_b);
        assert_eq!(BoardVariant::from_cmdline("bcm2709.disk_led_gpio=4"), pi_b);
    }

    #[test]
    fn display_names_model_and_base() {
        let shown = format!("{}", Board::from(BoardVariant::RaspberryPiB));
        assert_eq!(shown, "Raspberry Pi b (io @ 0x20000000, led gpio 16)");
    }
}
