//! Image load and unload events.

use super::{Fields, Layout, Payload};
use crate::decoder::Decoder;
use crate::error::Result;
use crate::fields::W16String;

pub const UNLOAD: u8 = 2;
pub const DC_START: u8 = 3;
pub const DC_END: u8 = 4;
pub const LOAD: u8 = 10;
pub const KERNEL_BASE: u8 = 33;
pub const HYPERCALL_PAGE: u8 = 34;

pub(crate) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    let layout = Layout {
        provider: "Image",
        opcode,
        version,
    };

    match opcode {
        UNLOAD => decode_image_load("UnLoad", layout, is_64_bit, decoder),
        DC_START => decode_image_load("DCStart", layout, is_64_bit, decoder),
        DC_END => decode_image_load("DCEnd", layout, is_64_bit, decoder),
        LOAD => decode_image_load("Load", layout, is_64_bit, decoder),
        KERNEL_BASE => {
            layout.require_version(&[2])?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields.pointer("ImageBase")?;
            Ok(fields.finish("KernelBase"))
        }
        HYPERCALL_PAGE => {
            layout.require_version(&[2])?;
            let mut fields = Fields::new(decoder, is_64_bit);
            fields.pointer("HypercallPageVa")?;
            Ok(fields.finish("HypercallPage"))
        }
        _ => Err(layout.unknown_opcode()),
    }
}

fn decode_image_load(
    name: &'static str,
    layout: Layout,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
) -> Result<Payload> {
    let mut fields = Fields::new(decoder, is_64_bit);

    match layout.version {
        0 => {
            fields
                .pointer("BaseAddress")?
                .field::<u32>("ModuleSize")?
                .field::<W16String>("ImageFileName")?;
        }
        1 => {
            fields
                .pointer("ImageBase")?
                .pointer("ImageSize")?
                .field::<u32>("ProcessId")?
                .field::<W16String>("FileName")?;
        }
        2 | 3 => {
            fields
                .pointer("ImageBase")?
                .pointer("ImageSize")?
                .field::<u32>("ProcessId")?
                .field::<u32>("ImageCheckSum")?
                .field::<u32>("TimeDateStamp")?;
            if layout.version == 2 {
                fields.field::<u32>("Reserved0")?;
            } else {
                fields
                    .field::<u8>("SignatureLevel")?
                    .field::<u8>("SignatureType")?
                    .field::<u16>("Reserved0")?;
            }
            fields
                .pointer("DefaultBase")?
                .field::<u32>("Reserved1")?
                .field::<u32>("Reserved2")?
                .field::<u32>("Reserved3")?
                .field::<u32>("Reserved4")?
                .field::<W16String>("FileName")?;
        }
        _ => return Err(layout.unsupported_version()),
    }

    Ok(fields.finish(name))
}
