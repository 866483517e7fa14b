//! Sampled profile, system call, interrupt and DPC events.

use super::{Fields, Layout, Payload};
use crate::decoder::Decoder;
use crate::error::Result;
use crate::fields::W16String;

pub const SAMPLE_PROF: u8 = 46;
pub const PMC_INTERRUPT: u8 = 47;
pub const SYSCALL_ENTER: u8 = 51;
pub const SYSCALL_EXIT: u8 = 52;
pub const THREADED_DPC: u8 = 66;
pub const ISR: u8 = 67;
pub const DPC: u8 = 68;
pub const TIMER_DPC: u8 = 69;
pub const SET_INTERVAL: u8 = 72;
pub const COLLECTION_START: u8 = 73;
pub const COLLECTION_END: u8 = 74;

pub(crate) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    let layout = Layout {
        provider: "PerfInfo",
        opcode,
        version,
    };

    match opcode {
        SAMPLE_PROF => {
            layout.require_version(&[2])?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields
                .pointer("InstructionPointer")?
                .field::<u32>("ThreadId")?
                .field::<u16>("Count")?
                .field::<u16>("Reserved")?;
            Ok(fields.finish("SampleProf"))
        }
        PMC_INTERRUPT => Ok(Payload::Unsupported {
            name: "PmcInterrupt",
        }),
        SYSCALL_ENTER => {
            layout.require_version(&[2])?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields.pointer("SysCallAddress")?;
            Ok(fields.finish("SysClEnter"))
        }
        SYSCALL_EXIT => {
            layout.require_version(&[2])?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields.field::<u32>("SysCallNtStatus")?;
            Ok(fields.finish("SysClExit"))
        }
        THREADED_DPC => decode_dpc("ThreadedDPC", layout, is_64_bit, decoder),
        DPC => decode_dpc("DPC", layout, is_64_bit, decoder),
        TIMER_DPC => decode_dpc("TimerDPC", layout, is_64_bit, decoder),
        ISR => {
            layout.require_version(&[2])?;
            layout.require_64_bit(is_64_bit)?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields
                .field::<u64>("InitialTime")?
                .pointer("Routine")?
                .field::<u8>("ReturnValue")?
                .field::<u16>("Vector")?
                .field::<u8>("Reserved")?;
            Ok(fields.finish("ISR"))
        }
        SET_INTERVAL => decode_interval("SetInterval", layout, is_64_bit, decoder),
        COLLECTION_START => decode_interval("CollectionStart", layout, is_64_bit, decoder),
        COLLECTION_END => decode_interval("CollectionEnd", layout, is_64_bit, decoder),
        _ => Err(layout.unknown_opcode()),
    }
}

// Only 64-bit DPC and ISR layouts have been checked against real traces.
fn decode_dpc(
    name: &'static str,
    layout: Layout,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    layout.require_version(&[2])?;
    layout.require_64_bit(is_64_bit)?;

    let mut fields = Fields::new(decoder, is_64_bit);
    fields.field::<u64>("InitialTime")?.pointer("Routine")?;
    Ok(fields.finish(name))
}

fn decode_interval(
    name: &'static str,
    layout: Layout,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    layout.require_version(&[2, 3])?;

    let mut fields = Fields::new(decoder, is_64_bit);
    fields
        .field::<u32>("Source")?
        .field::<u32>("NewInterval")?
        .field::<u32>("OldInterval")?
        .field::<W16String>("SourceName")?;
    Ok(fields.finish(name))
}
