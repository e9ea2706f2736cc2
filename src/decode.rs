//! Instruction decoding.
//!
//! A pure function from a 32-bit instruction word to an [`Instr`]. Never
//! fails: an encoding this core does not recognize decodes to
//! [`Instr::Illegal`] rather than returning an error, so both the executor
//! and the disassembler can treat decode as infallible.

use crate::instr::{BranchCond, Instr, LoadWidth, RegImmOp, RegRegOp, StoreWidth};
use crate::utils::{extract_field, sign_extend};

fn opcode(w: u32) -> u32 {
    extract_field(w, 6, 0)
}

fn rd(w: u32) -> u8 {
    extract_field(w, 11, 7) as u8
}

fn funct3(w: u32) -> u32 {
    extract_field(w, 14, 12)
}

fn rs1(w: u32) -> u8 {
    extract_field(w, 19, 15) as u8
}

fn rs2(w: u32) -> u8 {
    extract_field(w, 24, 20) as u8
}

fn funct7(w: u32) -> u32 {
    extract_field(w, 31, 25)
}

/// I-type immediate: `w[31:20]`, sign-extended from 12 bits.
fn imm_itype(w: u32) -> i32 {
    sign_extend(extract_field(w, 31, 20), 11) as i32
}

/// S-type immediate: `{w[31:25], w[11:7]}`, sign-extended from 12 bits.
fn imm_stype(w: u32) -> i32 {
    let hi = extract_field(w, 31, 25);
    let lo = extract_field(w, 11, 7);
    sign_extend((hi << 5) | lo, 11) as i32
}

/// B-type immediate: bits 12, 11, 10:5, 4:1 of `w`, bit 0 implicit zero,
/// sign-extended from 13 bits.
fn imm_btype(w: u32) -> i32 {
    let bit12 = extract_field(w, 31, 31) << 12;
    let bit11 = extract_field(w, 7, 7) << 11;
    let bits10_5 = extract_field(w, 30, 25) << 5;
    let bits4_1 = extract_field(w, 11, 8) << 1;
    let imm = bit12 | bit11 | bits10_5 | bits4_1;
    sign_extend(imm, 12) as i32
}

/// J-type immediate: bits 20, 19:12, 11, 10:1 of `w`, bit 0 implicit zero,
/// sign-extended from 21 bits.
fn imm_jtype(w: u32) -> i32 {
    let bit20 = extract_field(w, 31, 31) << 20;
    let bits19_12 = extract_field(w, 19, 12) << 12;
    let bit11 = extract_field(w, 20, 20) << 11;
    let bits10_1 = extract_field(w, 30, 21) << 1;
    let imm = bit20 | bits19_12 | bit11 | bits10_1;
    sign_extend(imm, 20) as i32
}

/// U-type immediate: upper 20 bits of `w`, low 12 bits zero. Already
/// sign-bearing (bit 31 of `w` is bit 31 of the result).
fn imm_utype(w: u32) -> i32 {
    (w & 0xffff_f000) as i32
}

pub fn decode(w: u32) -> Instr {
    match opcode(w) {
        0x33 => decode_regreg(w),
        0x13 => decode_regimm(w),
        0x03 => decode_load(w),
        0x23 => decode_store(w),
        0x63 => decode_branch(w),
        0x6f => Instr::Jal {
            rd: rd(w),
            imm: imm_jtype(w),
        },
        0x67 => {
            if funct3(w) == 0 {
                Instr::Jalr {
                    rd: rd(w),
                    rs1: rs1(w),
                    imm: imm_itype(w),
                }
            } else {
                Instr::Illegal(w)
            }
        }
        0x37 => Instr::Lui {
            rd: rd(w),
            imm: imm_utype(w),
        },
        0x17 => Instr::Auipc {
            rd: rd(w),
            imm: imm_utype(w),
        },
        0x73 => {
            // ECALL is encoded with funct3 == 0 and a zero I-immediate;
            // anything else under the system opcode is unimplemented.
            if funct3(w) == 0 && imm_itype(w) == 0 {
                Instr::Ecall
            } else {
                Instr::Illegal(w)
            }
        }
        _ => Instr::Illegal(w),
    }
}

fn decode_regreg(w: u32) -> Instr {
    let op = match (funct7(w), funct3(w)) {
        (0x00, 0x0) => RegRegOp::Add,
        (0x20, 0x0) => RegRegOp::Sub,
        (0x00, 0x1) => RegRegOp::Sll,
        (0x00, 0x2) => RegRegOp::Slt,
        (0x00, 0x4) => RegRegOp::Xor,
        (0x00, 0x5) => RegRegOp::Srl,
        (0x20, 0x5) => RegRegOp::Sra,
        (0x00, 0x6) => RegRegOp::Or,
        (0x00, 0x7) => RegRegOp::And,
        (0x01, 0x0) => RegRegOp::Mul,
        (0x01, 0x4) => RegRegOp::Div,
        (0x01, 0x5) => RegRegOp::Divu,
        _ => return Instr::Illegal(w),
    };
    Instr::RegReg {
        op,
        rd: rd(w),
        rs1: rs1(w),
        rs2: rs2(w),
    }
}

fn decode_regimm(w: u32) -> Instr {
    let shamt = (extract_field(w, 31, 20) & 0x1f) as i32;
    let op = match funct3(w) {
        0x0 => RegImmOp::Addi,
        0x2 => RegImmOp::Slti,
        0x4 => RegImmOp::Xori,
        0x6 => RegImmOp::Ori,
        0x7 => RegImmOp::Andi,
        0x1 => {
            if funct7(w) != 0x00 {
                return Instr::Illegal(w);
            }
            RegImmOp::Slli
        }
        0x5 => match funct7(w) {
            0x00 => RegImmOp::Srli,
            0x20 => RegImmOp::Srai,
            _ => return Instr::Illegal(w),
        },
        _ => return Instr::Illegal(w),
    };
    let imm = match op {
        RegImmOp::Slli | RegImmOp::Srli | RegImmOp::Srai => shamt,
        _ => imm_itype(w),
    };
    Instr::RegImm {
        op,
        rd: rd(w),
        rs1: rs1(w),
        imm,
    }
}

fn decode_load(w: u32) -> Instr {
    let width = match funct3(w) {
        0x0 => LoadWidth::B,
        0x1 => LoadWidth::H,
        0x2 => LoadWidth::W,
        0x4 => LoadWidth::Bu,
        0x5 => LoadWidth::Hu,
        _ => return Instr::Illegal(w),
    };
    Instr::Load {
        width,
        rd: rd(w),
        rs1: rs1(w),
        imm: imm_itype(w),
    }
}

fn decode_store(w: u32) -> Instr {
    let width = match funct3(w) {
        0x0 => StoreWidth::B,
        0x1 => StoreWidth::H,
        0x2 => StoreWidth::W,
        _ => return Instr::Illegal(w),
    };
    Instr::Store {
        width,
        rs1: rs1(w),
        rs2: rs2(w),
        imm: imm_stype(w),
    }
}

fn decode_branch(w: u32) -> Instr {
    let cond = match funct3(w) {
        0x0 => BranchCond::Eq,
        0x1 => BranchCond::Ne,
        0x4 => BranchCond::Lt,
        0x5 => BranchCond::Ge,
        0x6 => BranchCond::Ltu,
        0x7 => BranchCond::Geu,
        _ => return Instr::Illegal(w),
    };
    Instr::Branch {
        cond,
        rs1: rs1(w),
        rs2: rs2(w),
        imm: imm_btype(w),
    }
}
