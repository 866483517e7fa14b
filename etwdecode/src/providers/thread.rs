//! Thread lifetime, scheduling and priority events.

use super::{Fields, Layout, Payload};
use crate::decoder::Decoder;
use crate::error::Result;
use crate::fields::W16String;

pub const START: u8 = 1;
pub const END: u8 = 2;
pub const DC_START: u8 = 3;
pub const DC_END: u8 = 4;
pub const CSWITCH: u8 = 36;
pub const SET_PRIORITY: u8 = 48;
pub const SET_BASE_PRIORITY: u8 = 49;
pub const READY_THREAD: u8 = 50;
pub const SET_PAGE_PRIORITY: u8 = 51;
pub const SET_IO_PRIORITY: u8 = 52;
pub const AUTO_BOOST_SET_FLOOR: u8 = 66;
pub const AUTO_BOOST_CLEAR_FLOOR: u8 = 67;
pub const AUTO_BOOST_ENTRY_EXHAUSTION: u8 = 68;
pub const THREAD_SET_NAME: u8 = 72;

pub(crate) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    let layout = Layout {
        provider: "Thread",
        opcode,
        version,
    };

    match opcode {
        START => decode_thread_typegroup("Start", layout, is_64_bit, decoder),
        END => decode_thread_typegroup("End", layout, is_64_bit, decoder),
        DC_START => decode_thread_typegroup("DCStart", layout, is_64_bit, decoder),
        DC_END => decode_thread_typegroup("DCEnd", layout, is_64_bit, decoder),
        CSWITCH => {
            layout.require_version(&[2])?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields
                .field::<u32>("NewThreadId")?
                .field::<u32>("OldThreadId")?
                .field::<i8>("NewThreadPriority")?
                .field::<i8>("OldThreadPriority")?
                .field::<u8>("PreviousCState")?
                .field::<i8>("SpareByte")?
                .field::<i8>("OldThreadWaitReason")?
                .field::<i8>("OldThreadWaitMode")?
                .field::<i8>("OldThreadState")?
                .field::<i8>("OldThreadWaitIdealProcessor")?
                .field::<u32>("NewThreadWaitTime")?
                .field::<u32>("Reserved")?;
            Ok(fields.finish("CSwitch"))
        }
        READY_THREAD => {
            layout.require_version(&[2])?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields
                .field::<u32>("TThreadId")?
                .field::<i8>("AdjustReason")?
                .field::<i8>("AdjustIncrement")?
                .field::<i8>("Flag")?
                .field::<i8>("Reserved")?;
            Ok(fields.finish("ReadyThread"))
        }
        SET_PRIORITY => decode_priority("SetPriority", layout, is_64_bit, decoder),
        SET_BASE_PRIORITY => decode_priority("SetBasePriority", layout, is_64_bit, decoder),
        SET_PAGE_PRIORITY => decode_priority("SetPagePriority", layout, is_64_bit, decoder),
        SET_IO_PRIORITY => decode_priority("SetIoPriority", layout, is_64_bit, decoder),
        AUTO_BOOST_SET_FLOOR => Ok(Payload::Unsupported {
            name: "AutoBoostSetFloor",
        }),
        AUTO_BOOST_CLEAR_FLOOR => Ok(Payload::Unsupported {
            name: "AutoBoostClearFloor",
        }),
        AUTO_BOOST_ENTRY_EXHAUSTION => Ok(Payload::Unsupported {
            name: "AutoBoostEntryExhaustion",
        }),
        THREAD_SET_NAME => {
            layout.require_version(&[2])?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields
                .field::<u32>("ProcessId")?
                .field::<u32>("ThreadId")?
                .field::<W16String>("ThreadName")?;
            Ok(fields.finish("ThreadSetName"))
        }
        _ => Err(layout.unknown_opcode()),
    }
}

/// Start, End and the rundown opcodes share one layout per version, except
/// in version 1 where the end events only carry the ids.
fn decode_thread_typegroup(
    name: &'static str,
    layout: Layout,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    let mut fields = Fields::new(decoder, is_64_bit);

    match layout.version {
        0 => {
            fields
                .field::<u32>("TThreadId")?
                .field::<u32>("ProcessId")?;
        }
        1 => {
            fields
                .field::<u32>("ProcessId")?
                .field::<u32>("TThreadId")?;
            if layout.opcode == START || layout.opcode == DC_START {
                fields
                    .pointers(&[
                        "StackBase",
                        "StackLimit",
                        "UserStackBase",
                        "UserStackLimit",
                        "StartAddr",
                        "Win32StartAddr",
                    ])?
                    .field::<i8>("WaitMode")?;
            }
        }
        2 | 3 => {
            let start_address = if layout.version == 2 {
                "StartAddr"
            } else {
                "Affinity"
            };
            fields
                .field::<u32>("ProcessId")?
                .field::<u32>("TThreadId")?
                .pointers(&[
                    "StackBase",
                    "StackLimit",
                    "UserStackBase",
                    "UserStackLimit",
                    start_address,
                    "Win32StartAddr",
                    "TebBase",
                ])?
                .field::<u32>("SubProcessTag")?;
            if layout.version == 3 {
                fields
                    .field::<u8>("BasePriority")?
                    .field::<u8>("PagePriority")?
                    .field::<u8>("IoPriority")?
                    .field::<u8>("ThreadFlags")?;
            }
        }
        _ => return Err(layout.unsupported_version()),
    }

    Ok(fields.finish(name))
}

fn decode_priority(
    name: &'static str,
    layout: Layout,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    layout.require_version(&[3])?;

    let mut fields = Fields::new(decoder, is_64_bit);
    fields
        .field::<u32>("ThreadId")?
        .field::<u8>("OldPriority")?
        .field::<u8>("NewPriority")?
        .field::<u16>("Reserved")?;
    Ok(fields.finish(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::providers::{decode_provider_payload, Provider};
    use crate::testing_common::PayloadBuilder;
    use etwvalue::Value;

    fn thread_v3(is_64_bit: bool) -> PayloadBuilder {
        PayloadBuilder::new(is_64_bit)
            .u32(1200) // ProcessId
            .u32(8812) // TThreadId
            .pointer(0xA000) // StackBase
            .pointer(0x9000) // StackLimit
            .pointer(0x7000) // UserStackBase
            .pointer(0x6000) // UserStackLimit
            .pointer(0xFF) // Affinity
            .pointer(0x4010_2000) // Win32StartAddr
            .pointer(0x3000) // TebBase
            .u32(0) // SubProcessTag
            .u8(8)
            .u8(5)
            .u8(2)
            .u8(0)
    }

    #[test]
    fn start_v3() {
        let payload = thread_v3(true).into_bytes();
        let decoded = decode_provider_payload(Provider::Thread, 3, START, true, &payload).unwrap();

        assert_eq!(decoded.name(), "Start");
        let fields = decoded.fields().unwrap();
        assert_eq!(fields.field_count(), 14);
        assert_eq!(fields.field_as_uint("TThreadId"), Some(8812));
        assert_eq!(fields.get_field("Affinity"), Some(&Value::ULong(0xFF)));
        assert!(!fields.has_field("StartAddr"));
        assert_eq!(fields.get_field("BasePriority"), Some(&Value::UChar(8)));
    }

    #[test]
    fn dc_end_v2_32_bit() {
        let payload = PayloadBuilder::new(false)
            .u32(4)
            .u32(8)
            .pointer(1)
            .pointer(2)
            .pointer(3)
            .pointer(4)
            .pointer(0x7710_0000)
            .pointer(6)
            .pointer(7)
            .u32(0)
            .into_bytes();
        let decoded = decode_provider_payload(Provider::Thread, 2, DC_END, false, &payload).unwrap();

        assert_eq!(decoded.name(), "DCEnd");
        let fields = decoded.fields().unwrap();
        assert_eq!(fields.get_field("StartAddr"), Some(&Value::UInt(0x7710_0000)));
        assert!(!fields.has_field("BasePriority"));
    }

    #[test]
    fn v1_end_carries_only_ids() {
        let payload = PayloadBuilder::new(true).u32(4).u32(8).into_bytes();
        let decoded = decode_provider_payload(Provider::Thread, 1, END, true, &payload).unwrap();
        let names: Vec<_> = decoded.fields().unwrap().field_names().collect();
        assert_eq!(names, vec!["ProcessId", "TThreadId"]);

        // The start layout of the same version is much longer.
        assert!(matches!(
            decode_provider_payload(Provider::Thread, 1, START, true, &payload),
            Err(DecodeError::Exhausted { .. })
        ));
    }

    #[test]
    fn v1_start() {
        let payload = PayloadBuilder::new(false)
            .u32(4)
            .u32(8)
            .pointer(1)
            .pointer(2)
            .pointer(3)
            .pointer(4)
            .pointer(5)
            .pointer(6)
            .i8(-1)
            .into_bytes();
        let decoded = decode_provider_payload(Provider::Thread, 1, DC_START, false, &payload).unwrap();
        assert_eq!(
            decoded.fields().unwrap().get_field("WaitMode"),
            Some(&Value::Char(-1))
        );
    }

    #[test]
    fn v0_puts_thread_id_first() {
        let payload = PayloadBuilder::new(false).u32(77).u32(4).into_bytes();
        let decoded = decode_provider_payload(Provider::Thread, 0, START, false, &payload).unwrap();
        let fields = decoded.fields().unwrap();
        assert_eq!(fields.field_names().next(), Some("TThreadId"));
        assert_eq!(fields.field_as_uint("TThreadId"), Some(77));
    }

    #[test]
    fn context_switch() {
        let payload = PayloadBuilder::new(true)
            .u32(100)
            .u32(200)
            .i8(9)
            .i8(8)
            .u8(1)
            .i8(0)
            .i8(6) // OldThreadWaitReason
            .i8(1)
            .i8(5)
            .i8(3)
            .u32(42)
            .u32(0)
            .into_bytes();
        assert_eq!(payload.len(), 24);

        let decoded = decode_provider_payload(Provider::Thread, 2, CSWITCH, true, &payload).unwrap();
        let fields = decoded.fields().unwrap();
        assert_eq!(fields.field_as_uint("NewThreadId"), Some(100));
        assert_eq!(fields.get_field("OldThreadWaitReason"), Some(&Value::Char(6)));
        assert_eq!(fields.field_as_int("NewThreadPriority"), Some(9));
        assert_eq!(fields.field_as_uint("NewThreadWaitTime"), Some(42));
    }

    #[test]
    fn ready_thread() {
        let payload = PayloadBuilder::new(true)
            .u32(512)
            .i8(1)
            .i8(2)
            .i8(0)
            .i8(0)
            .into_bytes();
        let decoded =
            decode_provider_payload(Provider::Thread, 2, READY_THREAD, true, &payload).unwrap();
        assert_eq!(decoded.name(), "ReadyThread");
        assert_eq!(
            decoded.fields().unwrap().get_field("AdjustIncrement"),
            Some(&Value::Char(2))
        );
    }

    #[test]
    fn priority_changes() {
        let payload = PayloadBuilder::new(true).u32(512).u8(8).u8(10).u16(0).into_bytes();
        for &(opcode, name) in &[
            (SET_PRIORITY, "SetPriority"),
            (SET_BASE_PRIORITY, "SetBasePriority"),
            (SET_PAGE_PRIORITY, "SetPagePriority"),
            (SET_IO_PRIORITY, "SetIoPriority"),
        ] {
            let decoded = decode_provider_payload(Provider::Thread, 3, opcode, true, &payload).unwrap();
            assert_eq!(decoded.name(), name);
            assert_eq!(
                decoded.fields().unwrap().get_field("NewPriority"),
                Some(&Value::UChar(10))
            );
        }

        assert!(matches!(
            decode_provider_payload(Provider::Thread, 2, SET_PRIORITY, true, &payload),
            Err(DecodeError::UnsupportedVersion { version: 2, .. })
        ));
    }

    #[test]
    fn thread_set_name() {
        let payload = PayloadBuilder::new(true)
            .u32(1200)
            .u32(8812)
            .w16string("worker-3")
            .into_bytes();
        let decoded =
            decode_provider_payload(Provider::Thread, 2, THREAD_SET_NAME, true, &payload).unwrap();
        assert_eq!(
            decoded.fields().unwrap().field_as_wstring("ThreadName"),
            Some("worker-3")
        );
    }

    #[test]
    fn auto_boost_is_unsupported() {
        for &opcode in &[
            AUTO_BOOST_SET_FLOOR,
            AUTO_BOOST_CLEAR_FLOOR,
            AUTO_BOOST_ENTRY_EXHAUSTION,
        ] {
            let decoded = decode_provider_payload(Provider::Thread, 2, opcode, true, &[0; 8]).unwrap();
            assert!(!decoded.is_decoded());
        }
    }

    #[test]
    fn unknown_version_is_rejected() {
        let payload = thread_v3(true).into_bytes();
        assert_eq!(
            decode_provider_payload(Provider::Thread, 4, START, true, &payload),
            Err(DecodeError::UnsupportedVersion {
                provider: "Thread",
                opcode: START,
                version: 4
            })
        );
    }
}
