use super::Protocol;
use serial::{SerialPort, SystemPort};

#[derive(Clone, Copy)]
pub struct Serial {
    pub baud_rate: serial::BaudRate,
    pub data_bits: serial::CharSize,
    pub parity: serial::Parity,
    pub stop_bits: serial::StopBits,
    pub flow_control: serial::FlowControl,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            baud_rate: serial::Baud9600,
            data_bits: serial::Bits8,
            parity: serial::ParityNone,
            stop_bits: serial::Stop1,
            flow_control: serial::FlowNone,
        }
    }
}

impl Serial {
    /// Device path of VISA board `ASRL<n>`.
    #[cfg(windows)]
    pub fn format_address(board: u8) -> String {
        format!("COM{}", board)
    }
    #[cfg(not(windows))]
    pub fn format_address(board: u8) -> String {
        format!("/dev/ttyS{}", board.saturating_sub(1))
    }
}

fn config_serial<T: SerialPort>(port: &mut T, config: Serial) -> serial::Result<()> {
    port.reconfigure(&|settings| {
        settings.set_baud_rate(config.baud_rate)?;
        settings.set_char_size(config.data_bits);
        settings.set_parity(config.parity);
        settings.set_stop_bits(config.stop_bits);
        settings.set_flow_control(config.flow_control);
        Ok(())
    })
}

impl Protocol for Serial {
    type Address = u8;
    type Error = serial::Error;
    type IO = SystemPort;
    fn connect(
        self,
        address: Self::Address,
        time_out: std::time::Duration,
    ) -> Result<Self::IO, Self::Error> {
        let mut port = serial::open(&Self::format_address(address))?;
        config_serial(&mut port, self)?;
        port.set_timeout(time_out)?;
        Ok(port)
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::Serial;

    #[test]
    fn visa_board_numbers_start_at_one() {
        assert_eq!(Serial::format_address(1), "/dev/ttyS0");
        assert_eq!(Serial::format_address(4), "/dev/ttyS3");
    }
}
