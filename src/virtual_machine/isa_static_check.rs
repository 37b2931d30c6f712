#[cfg(test)]
mod tests {
    use crate::virtual_machine::isa::Instruction;

    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    const EXPECTED_ISA_HASH: u64 = 467301086231470546;

    fn fnv1a64(mut h: u64, bytes: &[u8]) -> u64 {
        for b in bytes {
            h ^= *b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }

    // Name, opcode, syntax, length and cycles are the binary contract.
    macro_rules! hash_isa {
        (
            $(
                $(#[$doc:meta])*
                $name:ident = $opcode:literal, $syntax:literal => $op:ident,
                $mode:ident $( ( $reg:ident ) )?, $len:literal, $cycles:ident ( $( $c:literal ),+ )
            ),* $(,)?
        ) => {{
            let mut h = FNV_OFFSET;
            $(
                h = fnv1a64(h, stringify!($name).as_bytes());
                h = fnv1a64(h, &[crate::virtual_machine::isa::Instruction::$name as u8]);
                h = fnv1a64(h, $syntax.as_bytes());
                h = fnv1a64(h, &[$len as u8]);
                h = fnv1a64(h, &crate::virtual_machine::isa::Instruction::$name.cycles().encode());
            )*
            h
        }};
    }

    fn current_isa_hash() -> u64 {
        crate::for_each_instruction!(hash_isa)
    }

    #[test]
    #[ignore]
    fn print_isa_hash() {
        println!("ISA_HASH={}", current_isa_hash());
    }

    #[test]
    fn isa_hash_unchanged() {
        assert_eq!(current_isa_hash(), EXPECTED_ISA_HASH);
    }

    /// Opcode listing: opcode, syntax, length, cycle column.
    #[rustfmt::skip]
    const LISTING: &[(u8, &str, usize, &str)] = &[
        (0x00, "DONE", 1, "1"),
        (0x01, "HALT", 1, "1"),
        (0x02, "NUKE", 1, "1"),
        (0x03, "NOOP", 1, "1"),
        (0x04, "RETURN", 1, "1 if PL == 0 else 2"),
        (0x05, "JUMP", 1, "1"),
        (0x06, "JUMP <Number>", 2, "2"),
        (0x07, "FORK", 1, "1"),
        (0x08, "FORK <Number>", 2, "2"),
        (0x09, "ELSE", 1, "1"),
        (0x0A, "ELSE <Number>", 2, "2"),
        (0x0B, "CALL", 1, "1 if PL == 0 else 2"),
        (0x0C, "CALL <Number>", 2, "2 if PL == 0 else 3"),
        (0x0D, "RACE", 1, "1"),
        (0x0E, "RACE <Number>", 2, "2"),
        (0x0F, "POKE", 1, "1"),
        (0x10, "POKE <Number>", 2, "2"),
        (0x11, "LOCK", 1, "2"),
        (0x12, "LOCK <Number>", 2, "3"),
        (0x13, "FREE", 1, "2"),
        (0x14, "FREE <Number>", 2, "3"),
        (0x15, "READ", 1, "1 + (1 per 8-byte block)"),
        (0x16, "WRITE", 1, "1 + (1 per 8-byte block)"),
        (0x17, "ADDRESS", 1, "1"),
        (0x18, "ADDRESS <Number>", 2, "1"), // carries an operand byte
        (0x19, "EXECUTE", 1, "1"),
        (0x1A, "EXECUTE <Number>", 2, "1"), // carries an operand byte
        (0x1B, "OPERATE", 1, "1"),
        (0x1C, "OPERATE <Number>", 2, "1"), // carries an operand byte
        (0x1D, "SET", 1, "1"),
        (0x1E, "SET x", 1, "1"),
        (0x1F, "SET y", 1, "1"),
        (0x20, "SET z", 1, "1"),
        (0x21, "RESET", 1, "1"),
        (0x22, "RESET x", 1, "1"),
        (0x23, "RESET y", 1, "1"),
        (0x24, "RESET z", 1, "1"),
        (0x25, "COPY x", 1, "1"),
        (0x26, "COPY y", 1, "1"),
        (0x27, "COPY z", 1, "1"),
        (0x28, "COPY pc", 1, "1"),
        (0x29, "COPY sp", 1, "1"),
        (0x2A, "COPY fx", 1, "1"),
        (0x2B, "COPY cb", 1, "1"),
        (0x2C, "COPY sb", 1, "1"),
        (0x2D, "COPY db", 1, "1"),
        (0x2E, "SYNC x", 1, "1"),
        (0x2F, "SYNC y", 1, "1"),
        (0x30, "SYNC z", 1, "1"),
        (0x31, "SYNC pc", 1, "1"),
        (0x32, "SYNC sp", 1, "1"),
        (0x33, "SYNC fx", 1, "1"),
        (0x34, "SYNC cb", 1, "1"),
        (0x35, "SYNC sb", 1, "1"), // completes the SYNC register row
        (0x36, "SYNC db", 1, "1"),
        (0x37, "LOAD [x]", 1, "2"),
        (0x38, "LOAD [y]", 1, "2"),
        (0x39, "LOAD [z]", 1, "2"),
        (0x3A, "LOAD <Number>", 2, "2"),
        (0x3B, "LOAD [<Number>]", 2, "3"),
        (0x3C, "LOAD [<Number> x]", 2, "3"),
        (0x3D, "LOAD [<Number> y]", 2, "3"),
        (0x3E, "LOAD [<Number> z]", 2, "3"),
        (0x3F, "LOAD x <Number>", 2, "2"),
        (0x40, "LOAD y <Number>", 2, "2"),
        (0x41, "LOAD z <Number>", 2, "2"),
        (0x42, "LOAD pc <Number>", 2, "2"),
        (0x43, "LOAD sp <Number>", 2, "2"),
        (0x44, "LOAD fx <Number>", 2, "2"),
        (0x45, "LOAD cb <Number>", 2, "2"),
        (0x46, "LOAD sb <Number>", 2, "2"),
        (0x47, "LOAD db <Number>", 2, "2"),
        (0x48, "LOAD x [<Number>]", 2, "3"),
        (0x49, "LOAD y [<Number>]", 2, "3"),
        (0x4A, "LOAD z [<Number>]", 2, "3"),
        (0x4B, "LOAD pc [<Number>]", 2, "3"),
        (0x4C, "LOAD sp [<Number>]", 2, "3"),
        (0x4D, "LOAD fx [<Number>]", 2, "3"),
        (0x4E, "LOAD cb [<Number>]", 2, "3"),
        (0x4F, "LOAD sb [<Number>]", 2, "3"),
        (0x50, "LOAD db [<Number>]", 2, "3"),
        (0x51, "STORE [x]", 1, "2"),
        (0x52, "STORE [y]", 1, "2"),
        (0x53, "STORE [z]", 1, "2"),
        (0x54, "STORE [<Number>]", 2, "3"),
        (0x55, "STORE [<Number> x]", 2, "3"),
        (0x56, "STORE [<Number> y]", 2, "3"),
        (0x57, "STORE [<Number> z]", 2, "3"),
        (0x58, "PUSH", 1, "2"),
        (0x59, "PUSH x", 1, "2"),
        (0x5A, "PUSH y", 1, "2"),
        (0x5B, "PUSH z", 1, "2"),
        (0x5C, "PUSH pc", 1, "2"),
        (0x5D, "PUSH sp", 1, "2"),
        (0x5E, "PUSH fx", 1, "2"),
        (0x5F, "PUSH cb", 1, "2"),
        (0x60, "PUSH sb", 1, "2"),
        (0x61, "PUSH db", 1, "2"),
        (0x62, "PUSH <Number>", 2, "2"),
        (0x63, "POP", 1, "2"),
        (0x64, "POP x", 1, "2"),
        (0x65, "POP y", 1, "2"),
        (0x66, "POP z", 1, "2"),
        (0x67, "POP pc", 1, "2"),
        (0x68, "POP sp", 1, "2"),
        (0x69, "POP fx", 1, "2"),
        (0x6A, "POP cb", 1, "2"),
        (0x6B, "POP sb", 1, "2"),
        (0x6C, "POP db", 1, "2"),
        (0x6D, "DROP", 1, "1"),
        (0x6E, "DUPE", 1, "3"),
        (0x6F, "SWAP", 1, "3"),
        (0x70, "PEEK", 1, "2"),
        (0x71, "VOID", 1, "1"),
        (0x72, "PACK", 1, "1"),
        (0x73, "PACK x", 1, "1"),
        (0x74, "PACK y", 1, "1"),
        (0x75, "PACK z", 1, "1"),
        (0x76, "PACK pc", 1, "1"),
        (0x77, "PACK sp", 1, "1"),
        (0x78, "PACK fx", 1, "1"),
        (0x79, "PACK cb", 1, "1"),
        (0x7A, "PACK sb", 1, "1"),
        (0x7B, "PACK db", 1, "1"),
        (0x7C, "PACK $", 1, "2"),
        (0x7D, "PACK <Number>", 2, "2"),
        (0x7E, "PASS", 1, "1 if PL == 0 else 2"),
        (0x7F, "DUMP", 1, "1"),
        (0x80, "POLL", 1, "1"),
        (0x81, "EQ <Number>", 2, "2"),
        (0x82, "EQ x", 1, "1"),
        (0x83, "EQ y", 1, "1"),
        (0x84, "EQ z", 1, "1"),
        (0x85, "EQ $", 1, "2"),
        (0x86, "GT <Number>", 2, "2"),
        (0x87, "GT x", 1, "1"),
        (0x88, "GT y", 1, "1"),
        (0x89, "GT z", 1, "1"),
        (0x8A, "GT $", 1, "2"),
        (0x8B, "LT <Number>", 2, "2"),
        (0x8C, "LT x", 1, "1"),
        (0x8D, "LT y", 1, "1"),
        (0x8E, "LT z", 1, "1"),
        (0x8F, "LT $", 1, "2"),
        (0x90, "NEQ <Number>", 2, "2"),
        (0x91, "NEQ x", 1, "1"),
        (0x92, "NEQ y", 1, "1"),
        (0x93, "NEQ z", 1, "1"),
        (0x94, "NEQ $", 1, "2"),
        (0x95, "NGT <Number>", 2, "2"),
        (0x96, "NGT x", 1, "1"),
        (0x97, "NGT y", 1, "1"),
        (0x98, "NGT z", 1, "1"),
        (0x99, "NGT $", 1, "2"),
        (0x9A, "NLT <Number>", 2, "2"),
        (0x9B, "NLT x", 1, "1"),
        (0x9C, "NLT y", 1, "1"),
        (0x9D, "NLT z", 1, "1"),
        (0x9E, "NLT $", 1, "2"),
        (0x9F, "CLZ", 1, "1"),
        (0xA0, "CLZ $", 1, "3"),
        (0xA1, "CTZ", 1, "1"),
        (0xA2, "CTZ $", 1, "3"),
        (0xA3, "NSA", 1, "1"),
        (0xA4, "NSA $", 1, "3"),
        (0xA5, "NOT", 1, "1"),
        (0xA6, "NOT $", 1, "3"),
        (0xA7, "INC", 1, "1"),
        (0xA8, "INC x", 1, "1"),
        (0xA9, "INC y", 1, "1"),
        (0xAA, "INC z", 1, "1"),
        (0xAB, "INC $", 1, "3"),
        (0xAC, "DEC", 1, "1"),
        (0xAD, "DEC x", 1, "1"),
        (0xAE, "DEC y", 1, "1"),
        (0xAF, "DEC z", 1, "1"),
        (0xB0, "DEC $", 1, "3"),
        (0xB1, "ADD <Number>", 2, "2"),
        (0xB2, "ADD x", 1, "1"),
        (0xB3, "ADD y", 1, "1"),
        (0xB4, "ADD z", 1, "1"),
        (0xB5, "ADD $", 1, "3"),
        (0xB6, "SUB <Number>", 2, "2"),
        (0xB7, "SUB x", 1, "1"),
        (0xB8, "SUB y", 1, "1"),
        (0xB9, "SUB z", 1, "1"),
        (0xBA, "SUB $", 1, "3"),
        (0xBB, "TALLY <Number>", 2, "2"),
        (0xBC, "TALLY x", 1, "1"),
        (0xBD, "TALLY y", 1, "1"),
        (0xBE, "TALLY z", 1, "1"),
        (0xBF, "TALLY $", 1, "3"),
        (0xC0, "DEBIT <Number>", 2, "2"),
        (0xC1, "DEBIT x", 1, "1"),
        (0xC2, "DEBIT y", 1, "1"),
        (0xC3, "DEBIT z", 1, "1"),
        (0xC4, "DEBIT $", 1, "3"),
        (0xC5, "MUL <Number>", 2, "2"),
        (0xC6, "MUL x", 1, "1"),
        (0xC7, "MUL y", 1, "1"),
        (0xC8, "MUL z", 1, "1"),
        (0xC9, "MUL $", 1, "3"),
        (0xCA, "DIV <Number>", 2, "2"),
        (0xCB, "DIV x", 1, "1"),
        (0xCC, "DIV y", 1, "1"),
        (0xCD, "DIV z", 1, "1"),
        (0xCE, "DIV $", 1, "3"),
        (0xCF, "MOD <Number>", 2, "2"),
        (0xD0, "MOD x", 1, "1"),
        (0xD1, "MOD y", 1, "1"),
        (0xD2, "MOD z", 1, "1"),
        (0xD3, "MOD $", 1, "3"),
        (0xD4, "AND <Number>", 2, "2"),
        (0xD5, "AND x", 1, "1"),
        (0xD6, "AND y", 1, "1"),
        (0xD7, "AND z", 1, "1"),
        (0xD8, "AND $", 1, "3"),
        (0xD9, "OR <Number>", 2, "2"),
        (0xDA, "OR x", 1, "1"),
        (0xDB, "OR y", 1, "1"),
        (0xDC, "OR z", 1, "1"),
        (0xDD, "OR $", 1, "3"),
        (0xDE, "XOR <Number>", 2, "2"),
        (0xDF, "XOR x", 1, "1"),
        (0xE0, "XOR y", 1, "1"),
        (0xE1, "XOR z", 1, "1"),
        (0xE2, "XOR $", 1, "3"),
        (0xE3, "ZSH <Number>", 2, "2"),
        (0xE4, "ZSH x", 1, "1"),
        (0xE5, "ZSH y", 1, "1"),
        (0xE6, "ZSH z", 1, "1"),
        (0xE7, "ZSH $", 1, "3"),
        (0xE8, "SSH <Number>", 2, "2"),
        (0xE9, "SSH x", 1, "1"),
        (0xEA, "SSH y", 1, "1"),
        (0xEB, "SSH z", 1, "1"),
        (0xEC, "SSH $", 1, "3"),
        (0xED, "LSH <Number>", 2, "2"),
        (0xEE, "LSH x", 1, "1"),
        (0xEF, "LSH y", 1, "1"),
        (0xF0, "LSH z", 1, "1"),
        (0xF1, "LSH $", 1, "3"),
        (0xF2, "ROT <Number>", 2, "2"),
        (0xF3, "ROT x", 1, "1"),
        (0xF4, "ROT y", 1, "1"),
        (0xF5, "ROT z", 1, "1"),
        (0xF6, "ROT $", 1, "3"),
    ];

    fn check_cycles(instr: Instruction, column: &str) {
        let syntax = instr.syntax();
        let cycles = instr.cycles();
        if let Some((code, pipe)) = column.split_once(" if PL == 0 else ") {
            assert_eq!(cycles.resolve(false, 0), code.parse::<u64>().unwrap(), "{syntax}");
            assert_eq!(cycles.resolve(true, 0), pipe.parse::<u64>().unwrap(), "{syntax}");
        } else if let Some(base) = column.strip_suffix(" + (1 per 8-byte block)") {
            let base: u64 = base.parse().unwrap();
            for (len, blocks) in [(0, 0), (1, 1), (8, 1), (9, 2), (255, 32)] {
                assert_eq!(cycles.resolve(false, len), base + blocks, "{syntax} with A = {len}");
            }
        } else {
            let n: u64 = column.parse().unwrap();
            assert_eq!(cycles.resolve(false, 0), n, "{syntax}");
            assert_eq!(cycles.resolve(true, 0), n, "{syntax} in the pipe stream");
        }
    }

    #[test]
    fn table_matches_listing() {
        assert_eq!(Instruction::ALL.len(), LISTING.len());
        for (&instr, &(opcode, syntax, len, column)) in Instruction::ALL.iter().zip(LISTING) {
            assert_eq!(instr as u8, opcode, "{syntax}");
            assert_eq!(Instruction::try_from(opcode), Ok(instr), "{syntax}");
            assert_eq!(instr.syntax(), syntax, "opcode {opcode:#04x}");
            assert_eq!(instr.size(), len, "{syntax}");
            check_cycles(instr, column);
        }
    }
}
