//! Process lifetime and performance counter events.

use super::{Fields, Layout, Payload};
use crate::decoder::Decoder;
use crate::error::Result;
use crate::fields::{NarrowString, W16String};

pub const START: u8 = 1;
pub const END: u8 = 2;
pub const DC_START: u8 = 3;
pub const DC_END: u8 = 4;
pub const TERMINATE: u8 = 11;
pub const PERF_CTR: u8 = 32;
pub const PERF_CTR_RUNDOWN: u8 = 33;
pub const DEFUNCT: u8 = 39;

const PERF_CTR_POINTERS: &[&str] = &[
    "PeakVirtualSize",
    "PeakWorkingSetSize",
    "PeakPagefileUsage",
    "QuotaPeakPagedPoolUsage",
    "QuotaPeakNonPagedPoolUsage",
    "VirtualSize",
    "WorkingSetSize",
    "PagefileUsage",
    "QuotaPagedPoolUsage",
    "QuotaNonPagedPoolUsage",
    "PrivatePageCount",
];

pub(crate) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    let layout = Layout {
        provider: "Process",
        opcode,
        version,
    };

    match opcode {
        START => decode_process_typegroup("Start", layout, is_64_bit, decoder),
        END => decode_process_typegroup("End", layout, is_64_bit, decoder),
        DC_START => decode_process_typegroup("DCStart", layout, is_64_bit, decoder),
        DC_END => decode_process_typegroup("DCEnd", layout, is_64_bit, decoder),
        DEFUNCT => decode_process_typegroup("Defunct", layout, is_64_bit, decoder),
        TERMINATE => Ok(Payload::Unsupported { name: "Terminate" }),
        PERF_CTR => decode_perf_ctr("PerfCtr", layout, is_64_bit, decoder),
        PERF_CTR_RUNDOWN => decode_perf_ctr("PerfCtrRundown", layout, is_64_bit, decoder),
        _ => Err(layout.unknown_opcode()),
    }
}

fn decode_process_typegroup(
    name: &'static str,
    layout: Layout,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    let version = layout.version;
    if !(1..=4).contains(&version) {
        return Err(layout.unsupported_version());
    }

    let mut fields = Fields::new(decoder, is_64_bit);

    if version == 1 {
        fields.pointer("PageDirectoryBase")?;
    } else {
        fields.pointer("UniqueProcessKey")?;
    }
    fields
        .field::<u32>("ProcessId")?
        .field::<u32>("ParentId")?
        .field::<u32>("SessionId")?
        .field::<i32>("ExitStatus")?;
    if version >= 3 {
        fields.pointer("DirectoryTableBase")?;
    }
    if version >= 4 {
        fields.field::<u32>("Flags")?;
    }
    fields
        .sid("UserSID")?
        .field::<NarrowString>("ImageFileName")?;
    if version >= 2 {
        fields.field::<W16String>("CommandLine")?;
    }
    if version >= 4 {
        fields
            .field::<W16String>("PackageFullName")?
            .field::<W16String>("ApplicationId")?;
    }

    Ok(fields.finish(name))
}

fn decode_perf_ctr(
    name: &'static str,
    layout: Layout,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    layout.require_version(&[2])?;

    let mut fields = Fields::new(decoder, is_64_bit);
    fields
        .field::<u32>("ProcessId")?
        .field::<u32>("PageFaultCount")?
        .field::<u32>("HandleCount")?
        .field::<u32>("Reserved")?
        .pointers(PERF_CTR_POINTERS)?;
    Ok(fields.finish(name))
}
