use super::{unexpected_payload, SensorDriver};
use crate::data::{BluetoothData, BluetoothDevice, SensorData};
use crate::error::SensorError;
use crate::event::EventPayload;
use crate::types::SensorKind;

/// Driver for Bluetooth discovery results.
///
/// A scan may report the same device more than once; only the first
/// sighting of each address is kept.
pub struct BluetoothDriver;

impl SensorDriver for BluetoothDriver {
    fn kind(&self) -> SensorKind {
        SensorKind::Bluetooth
    }

    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
        let EventPayload::BluetoothScan { devices } = payload else {
            return Err(unexpected_payload(SensorKind::Bluetooth, payload));
        };

        let mut unique: Vec<BluetoothDevice> = Vec::with_capacity(devices.len());
        for device in devices {
            if !unique.iter().any(|seen| seen.address == device.address) {
                unique.push(device.clone());
            }
        }

        Ok(SensorData::Bluetooth(BluetoothData { devices: unique }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(address: &str, rssi: i16) -> BluetoothDevice {
        BluetoothDevice {
            name: None,
            address: address.to_string(),
            rssi,
        }
    }

    #[test]
    fn test_scan_deduplicates_addresses() {
        let data = BluetoothDriver
            .build_data(&EventPayload::BluetoothScan {
                devices: vec![
                    device("AA:AA", -50),
                    device("BB:BB", -70),
                    device("AA:AA", -55),
                ],
            })
            .unwrap();

        assert_eq!(
            data,
            SensorData::Bluetooth(BluetoothData {
                devices: vec![device("AA:AA", -50), device("BB:BB", -70)],
            })
        );
    }

    #[test]
    fn test_empty_scan() {
        let data = BluetoothDriver
            .build_data(&EventPayload::BluetoothScan { devices: vec![] })
            .unwrap();
        assert_eq!(data, SensorData::Bluetooth(BluetoothData { devices: vec![] }));
    }
}
