//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction table and hands it to a callback macro, so the opcode
//! enum, the listing and the frozen hash check all read the same records.
//!
//! Each record is `Name = opcode, "SYNTAX" => Operation, Mode, length, cycles`.
//! The opcode of a record is its position in the table: the table starts at
//! `0x00` and has no gaps. Bytes `0xF7..=0xFF` are not instructions.
//!
//! # Bytecode Format
//!
//! - Opcode: 1 byte
//! - Operand: 0 or 1 byte, as given by the [`Mode`]
//!
//! Cycles are either fixed, different in the pipe stream (`Piped(code, pipe)`),
//! or one dispatch cycle plus one per started 8-byte block of A bytes
//! (`Block(base)`).

use crate::virtual_machine::errors::Fault;
use crate::virtual_machine::memory::blocks;
use crate::virtual_machine::operand::{Mode, Register};

/// Invokes a callback macro with the complete instruction definition list.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Control flow
            // =========================
            /// DONE ; retire this lane
            Done = 0x00, "DONE" => Done, Implicit, 1, Fixed(1),
            /// HALT ; retire every lane, keep memory
            Halt = 0x01, "HALT" => Halt, Implicit, 1, Fixed(1),
            /// NUKE ; retire every lane, restore every bank
            Nuke = 0x02, "NUKE" => Nuke, Implicit, 1, Fixed(1),
            /// NOOP ; no operation
            Noop = 0x03, "NOOP" => Noop, Implicit, 1, Fixed(1),
            /// RETURN ; pop a call frame
            Return = 0x04, "RETURN" => Return, Implicit, 1, Piped(1, 2),
            /// JUMP ; pc = A
            Jump = 0x05, "JUMP" => Jump, Implicit, 1, Fixed(1),
            /// JUMP <Number> ; pc = n
            JumpN = 0x06, "JUMP <Number>" => Jump, Immediate, 2, Fixed(2),
            /// FORK ; spawn a lane at A
            Fork = 0x07, "FORK" => Fork, Implicit, 1, Fixed(1),
            /// FORK <Number> ; spawn a lane at n
            ForkN = 0x08, "FORK <Number>" => Fork, Immediate, 2, Fixed(2),
            /// ELSE ; pc = A when fx == 0
            Else = 0x09, "ELSE" => Else, Implicit, 1, Fixed(1),
            /// ELSE <Number> ; pc = n when fx == 0
            ElseN = 0x0A, "ELSE <Number>" => Else, Immediate, 2, Fixed(2),
            /// CALL ; push frame, pc = A
            Call = 0x0B, "CALL" => Call, Implicit, 1, Piped(1, 2),
            /// CALL <Number> ; push frame, pc = n
            CallN = 0x0C, "CALL <Number>" => Call, Immediate, 2, Piped(2, 3),
            /// RACE ; spawn a racing lane at A
            Race = 0x0D, "RACE" => Race, Implicit, 1, Fixed(1),
            /// RACE <Number> ; spawn a racing lane at n
            RaceN = 0x0E, "RACE <Number>" => Race, Immediate, 2, Fixed(2),
            /// POKE ; win the race
            Poke = 0x0F, "POKE" => Poke, Implicit, 1, Fixed(1),
            /// POKE <Number> ; win the race, then pc = n
            PokeN = 0x10, "POKE <Number>" => Poke, Immediate, 2, Fixed(2),
            /// LOCK ; acquire lock A
            Lock = 0x11, "LOCK" => Lock, Implicit, 1, Fixed(2),
            /// LOCK <Number> ; acquire lock n
            LockN = 0x12, "LOCK <Number>" => Lock, Immediate, 2, Fixed(3),
            /// FREE ; release lock A
            Free = 0x13, "FREE" => Free, Implicit, 1, Fixed(2),
            /// FREE <Number> ; release lock n
            FreeN = 0x14, "FREE <Number>" => Free, Immediate, 2, Fixed(3),
            // =========================
            // Block
            // =========================
            /// READ ; copy A bytes io[cursor] -> data[db:x]
            Read = 0x15, "READ" => Read, Implicit, 1, Block(1),
            /// WRITE ; copy A bytes data[db:x] -> io[cursor]
            Write = 0x16, "WRITE" => Write, Implicit, 1, Block(1),
            /// ADDRESS ; io cursor = A
            Address = 0x17, "ADDRESS" => Address, Implicit, 1, Fixed(1),
            /// ADDRESS <Number> ; io cursor = n
            AddressN = 0x18, "ADDRESS <Number>" => Address, Immediate, 2, Fixed(1),
            /// EXECUTE ; run the whole pipe as code
            Execute = 0x19, "EXECUTE" => Execute, Implicit, 1, Fixed(1),
            /// EXECUTE <Number> ; run n pipe bytes as code
            ExecuteN = 0x1A, "EXECUTE <Number>" => Execute, Immediate, 2, Fixed(1),
            /// OPERATE ; host operation A
            Operate = 0x1B, "OPERATE" => Operate, Implicit, 1, Fixed(1),
            /// OPERATE <Number> ; host operation n
            OperateN = 0x1C, "OPERATE <Number>" => Operate, Immediate, 2, Fixed(1),
            // =========================
            // Register
            // =========================
            /// SET ; A = 0
            Set = 0x1D, "SET" => Set, Implicit, 1, Fixed(1),
            /// SET x ; x = 0
            SetX = 0x1E, "SET x" => Set, Register(X), 1, Fixed(1),
            /// SET y ; y = 0
            SetY = 0x1F, "SET y" => Set, Register(Y), 1, Fixed(1),
            /// SET z ; z = 0
            SetZ = 0x20, "SET z" => Set, Register(Z), 1, Fixed(1),
            /// RESET ; A = origin A
            Reset = 0x21, "RESET" => Reset, Implicit, 1, Fixed(1),
            /// RESET x ; x = origin x
            ResetX = 0x22, "RESET x" => Reset, Register(X), 1, Fixed(1),
            /// RESET y ; y = origin y
            ResetY = 0x23, "RESET y" => Reset, Register(Y), 1, Fixed(1),
            /// RESET z ; z = origin z
            ResetZ = 0x24, "RESET z" => Reset, Register(Z), 1, Fixed(1),
            /// COPY x ; A = x
            CopyX = 0x25, "COPY x" => Copy, Register(X), 1, Fixed(1),
            /// COPY y ; A = y
            CopyY = 0x26, "COPY y" => Copy, Register(Y), 1, Fixed(1),
            /// COPY z ; A = z
            CopyZ = 0x27, "COPY z" => Copy, Register(Z), 1, Fixed(1),
            /// COPY pc ; A = pc
            CopyPc = 0x28, "COPY pc" => Copy, Register(Pc), 1, Fixed(1),
            /// COPY sp ; A = sp
            CopySp = 0x29, "COPY sp" => Copy, Register(Sp), 1, Fixed(1),
            /// COPY fx ; A = fx
            CopyFx = 0x2A, "COPY fx" => Copy, Register(Fx), 1, Fixed(1),
            /// COPY cb ; A = cb
            CopyCb = 0x2B, "COPY cb" => Copy, Register(Cb), 1, Fixed(1),
            /// COPY sb ; A = sb
            CopySb = 0x2C, "COPY sb" => Copy, Register(Sb), 1, Fixed(1),
            /// COPY db ; A = db
            CopyDb = 0x2D, "COPY db" => Copy, Register(Db), 1, Fixed(1),
            /// SYNC x ; x = A
            SyncX = 0x2E, "SYNC x" => Sync, Register(X), 1, Fixed(1),
            /// SYNC y ; y = A
            SyncY = 0x2F, "SYNC y" => Sync, Register(Y), 1, Fixed(1),
            /// SYNC z ; z = A
            SyncZ = 0x30, "SYNC z" => Sync, Register(Z), 1, Fixed(1),
            /// SYNC pc ; pc = A
            SyncPc = 0x31, "SYNC pc" => Sync, Register(Pc), 1, Fixed(1),
            /// SYNC sp ; sp = A
            SyncSp = 0x32, "SYNC sp" => Sync, Register(Sp), 1, Fixed(1),
            /// SYNC fx ; fx = A
            SyncFx = 0x33, "SYNC fx" => Sync, Register(Fx), 1, Fixed(1),
            /// SYNC cb ; cb = A
            SyncCb = 0x34, "SYNC cb" => Sync, Register(Cb), 1, Fixed(1),
            /// SYNC sb ; sb = A
            SyncSb = 0x35, "SYNC sb" => Sync, Register(Sb), 1, Fixed(1),
            /// SYNC db ; db = A
            SyncDb = 0x36, "SYNC db" => Sync, Register(Db), 1, Fixed(1),
            /// LOAD [x] ; A = data[db:x]
            LoadIndirectX = 0x37, "LOAD [x]" => Load, Indirect(X), 1, Fixed(2),
            /// LOAD [y] ; A = data[db:y]
            LoadIndirectY = 0x38, "LOAD [y]" => Load, Indirect(Y), 1, Fixed(2),
            /// LOAD [z] ; A = data[db:z]
            LoadIndirectZ = 0x39, "LOAD [z]" => Load, Indirect(Z), 1, Fixed(2),
            /// LOAD <Number> ; A = n
            LoadN = 0x3A, "LOAD <Number>" => Load, Immediate, 2, Fixed(2),
            /// LOAD [<Number>] ; A = data[db:n]
            LoadAbsolute = 0x3B, "LOAD [<Number>]" => Load, Absolute, 2, Fixed(3),
            /// LOAD [<Number> x] ; A = data[db:n+x]
            LoadIndexedX = 0x3C, "LOAD [<Number> x]" => Load, Indexed(X), 2, Fixed(3),
            /// LOAD [<Number> y] ; A = data[db:n+y]
            LoadIndexedY = 0x3D, "LOAD [<Number> y]" => Load, Indexed(Y), 2, Fixed(3),
            /// LOAD [<Number> z] ; A = data[db:n+z]
            LoadIndexedZ = 0x3E, "LOAD [<Number> z]" => Load, Indexed(Z), 2, Fixed(3),
            /// LOAD x <Number> ; x = n
            LoadXN = 0x3F, "LOAD x <Number>" => Load, RegisterImmediate(X), 2, Fixed(2),
            /// LOAD y <Number> ; y = n
            LoadYN = 0x40, "LOAD y <Number>" => Load, RegisterImmediate(Y), 2, Fixed(2),
            /// LOAD z <Number> ; z = n
            LoadZN = 0x41, "LOAD z <Number>" => Load, RegisterImmediate(Z), 2, Fixed(2),
            /// LOAD pc <Number> ; pc = n
            LoadPcN = 0x42, "LOAD pc <Number>" => Load, RegisterImmediate(Pc), 2, Fixed(2),
            /// LOAD sp <Number> ; sp = n
            LoadSpN = 0x43, "LOAD sp <Number>" => Load, RegisterImmediate(Sp), 2, Fixed(2),
            /// LOAD fx <Number> ; fx = n
            LoadFxN = 0x44, "LOAD fx <Number>" => Load, RegisterImmediate(Fx), 2, Fixed(2),
            /// LOAD cb <Number> ; cb = n
            LoadCbN = 0x45, "LOAD cb <Number>" => Load, RegisterImmediate(Cb), 2, Fixed(2),
            /// LOAD sb <Number> ; sb = n
            LoadSbN = 0x46, "LOAD sb <Number>" => Load, RegisterImmediate(Sb), 2, Fixed(2),
            /// LOAD db <Number> ; db = n
            LoadDbN = 0x47, "LOAD db <Number>" => Load, RegisterImmediate(Db), 2, Fixed(2),
            /// LOAD x [<Number>] ; x = data[db:n]
            LoadXAbsolute = 0x48, "LOAD x [<Number>]" => Load, RegisterAbsolute(X), 2, Fixed(3),
            /// LOAD y [<Number>] ; y = data[db:n]
            LoadYAbsolute = 0x49, "LOAD y [<Number>]" => Load, RegisterAbsolute(Y), 2, Fixed(3),
            /// LOAD z [<Number>] ; z = data[db:n]
            LoadZAbsolute = 0x4A, "LOAD z [<Number>]" => Load, RegisterAbsolute(Z), 2, Fixed(3),
            /// LOAD pc [<Number>] ; pc = data[db:n]
            LoadPcAbsolute = 0x4B, "LOAD pc [<Number>]" => Load, RegisterAbsolute(Pc), 2, Fixed(3),
            /// LOAD sp [<Number>] ; sp = data[db:n]
            LoadSpAbsolute = 0x4C, "LOAD sp [<Number>]" => Load, RegisterAbsolute(Sp), 2, Fixed(3),
            /// LOAD fx [<Number>] ; fx = data[db:n]
            LoadFxAbsolute = 0x4D, "LOAD fx [<Number>]" => Load, RegisterAbsolute(Fx), 2, Fixed(3),
            /// LOAD cb [<Number>] ; cb = data[db:n]
            LoadCbAbsolute = 0x4E, "LOAD cb [<Number>]" => Load, RegisterAbsolute(Cb), 2, Fixed(3),
            /// LOAD sb [<Number>] ; sb = data[db:n]
            LoadSbAbsolute = 0x4F, "LOAD sb [<Number>]" => Load, RegisterAbsolute(Sb), 2, Fixed(3),
            /// LOAD db [<Number>] ; db = data[db:n]
            LoadDbAbsolute = 0x50, "LOAD db [<Number>]" => Load, RegisterAbsolute(Db), 2, Fixed(3),
            /// STORE [x] ; data[db:x] = A
            StoreIndirectX = 0x51, "STORE [x]" => Store, Indirect(X), 1, Fixed(2),
            /// STORE [y] ; data[db:y] = A
            StoreIndirectY = 0x52, "STORE [y]" => Store, Indirect(Y), 1, Fixed(2),
            /// STORE [z] ; data[db:z] = A
            StoreIndirectZ = 0x53, "STORE [z]" => Store, Indirect(Z), 1, Fixed(2),
            /// STORE [<Number>] ; data[db:n] = A
            StoreAbsolute = 0x54, "STORE [<Number>]" => Store, Absolute, 2, Fixed(3),
            /// STORE [<Number> x] ; data[db:n+x] = A
            StoreIndexedX = 0x55, "STORE [<Number> x]" => Store, Indexed(X), 2, Fixed(3),
            /// STORE [<Number> y] ; data[db:n+y] = A
            StoreIndexedY = 0x56, "STORE [<Number> y]" => Store, Indexed(Y), 2, Fixed(3),
            /// STORE [<Number> z] ; data[db:n+z] = A
            StoreIndexedZ = 0x57, "STORE [<Number> z]" => Store, Indexed(Z), 2, Fixed(3),
            // =========================
            // Stack
            // =========================
            /// PUSH ; push A
            Push = 0x58, "PUSH" => Push, Implicit, 1, Fixed(2),
            /// PUSH x ; push x
            PushX = 0x59, "PUSH x" => Push, Register(X), 1, Fixed(2),
            /// PUSH y ; push y
            PushY = 0x5A, "PUSH y" => Push, Register(Y), 1, Fixed(2),
            /// PUSH z ; push z
            PushZ = 0x5B, "PUSH z" => Push, Register(Z), 1, Fixed(2),
            /// PUSH pc ; push pc
            PushPc = 0x5C, "PUSH pc" => Push, Register(Pc), 1, Fixed(2),
            /// PUSH sp ; push sp
            PushSp = 0x5D, "PUSH sp" => Push, Register(Sp), 1, Fixed(2),
            /// PUSH fx ; push fx
            PushFx = 0x5E, "PUSH fx" => Push, Register(Fx), 1, Fixed(2),
            /// PUSH cb ; push cb
            PushCb = 0x5F, "PUSH cb" => Push, Register(Cb), 1, Fixed(2),
            /// PUSH sb ; push sb
            PushSb = 0x60, "PUSH sb" => Push, Register(Sb), 1, Fixed(2),
            /// PUSH db ; push db
            PushDb = 0x61, "PUSH db" => Push, Register(Db), 1, Fixed(2),
            /// PUSH <Number> ; push n
            PushN = 0x62, "PUSH <Number>" => Push, Immediate, 2, Fixed(2),
            /// POP ; pop into A
            Pop = 0x63, "POP" => Pop, Implicit, 1, Fixed(2),
            /// POP x ; pop into x
            PopX = 0x64, "POP x" => Pop, Register(X), 1, Fixed(2),
            /// POP y ; pop into y
            PopY = 0x65, "POP y" => Pop, Register(Y), 1, Fixed(2),
            /// POP z ; pop into z
            PopZ = 0x66, "POP z" => Pop, Register(Z), 1, Fixed(2),
            /// POP pc ; pop into pc
            PopPc = 0x67, "POP pc" => Pop, Register(Pc), 1, Fixed(2),
            /// POP sp ; pop into sp
            PopSp = 0x68, "POP sp" => Pop, Register(Sp), 1, Fixed(2),
            /// POP fx ; pop into fx
            PopFx = 0x69, "POP fx" => Pop, Register(Fx), 1, Fixed(2),
            /// POP cb ; pop into cb
            PopCb = 0x6A, "POP cb" => Pop, Register(Cb), 1, Fixed(2),
            /// POP sb ; pop into sb
            PopSb = 0x6B, "POP sb" => Pop, Register(Sb), 1, Fixed(2),
            /// POP db ; pop into db
            PopDb = 0x6C, "POP db" => Pop, Register(Db), 1, Fixed(2),
            /// DROP ; discard the top
            Drop = 0x6D, "DROP" => Drop, Implicit, 1, Fixed(1),
            /// DUPE ; duplicate the top
            Dupe = 0x6E, "DUPE" => Dupe, Implicit, 1, Fixed(3),
            /// SWAP ; swap the two top items
            Swap = 0x6F, "SWAP" => Swap, Implicit, 1, Fixed(3),
            /// PEEK ; A = top
            Peek = 0x70, "PEEK" => Peek, Implicit, 1, Fixed(2),
            /// VOID ; empty the stack
            Void = 0x71, "VOID" => Void, Implicit, 1, Fixed(1),
            // =========================
            // Pipe
            // =========================
            /// PACK ; enqueue A
            Pack = 0x72, "PACK" => Pack, Implicit, 1, Fixed(1),
            /// PACK x ; enqueue x
            PackX = 0x73, "PACK x" => Pack, Register(X), 1, Fixed(1),
            /// PACK y ; enqueue y
            PackY = 0x74, "PACK y" => Pack, Register(Y), 1, Fixed(1),
            /// PACK z ; enqueue z
            PackZ = 0x75, "PACK z" => Pack, Register(Z), 1, Fixed(1),
            /// PACK pc ; enqueue pc
            PackPc = 0x76, "PACK pc" => Pack, Register(Pc), 1, Fixed(1),
            /// PACK sp ; enqueue sp
            PackSp = 0x77, "PACK sp" => Pack, Register(Sp), 1, Fixed(1),
            /// PACK fx ; enqueue fx
            PackFx = 0x78, "PACK fx" => Pack, Register(Fx), 1, Fixed(1),
            /// PACK cb ; enqueue cb
            PackCb = 0x79, "PACK cb" => Pack, Register(Cb), 1, Fixed(1),
            /// PACK sb ; enqueue sb
            PackSb = 0x7A, "PACK sb" => Pack, Register(Sb), 1, Fixed(1),
            /// PACK db ; enqueue db
            PackDb = 0x7B, "PACK db" => Pack, Register(Db), 1, Fixed(1),
            /// PACK $ ; pop and enqueue
            PackStack = 0x7C, "PACK $" => Pack, Stack, 1, Fixed(2),
            /// PACK <Number> ; enqueue n
            PackN = 0x7D, "PACK <Number>" => Pack, Immediate, 2, Fixed(2),
            /// PASS ; A = dequeue
            Pass = 0x7E, "PASS" => Pass, Implicit, 1, Piped(1, 2),
            /// DUMP ; empty the pipe
            Dump = 0x7F, "DUMP" => Dump, Implicit, 1, Fixed(1),
            /// POLL ; A = pipe length
            Poll = 0x80, "POLL" => Poll, Implicit, 1, Fixed(1),
            // =========================
            // Comparison
            // =========================
            /// EQ <Number> ; fx = A == n
            EqN = 0x81, "EQ <Number>" => Eq, Immediate, 2, Fixed(2),
            /// EQ x ; fx = A == x
            EqX = 0x82, "EQ x" => Eq, Register(X), 1, Fixed(1),
            /// EQ y ; fx = A == y
            EqY = 0x83, "EQ y" => Eq, Register(Y), 1, Fixed(1),
            /// EQ z ; fx = A == z
            EqZ = 0x84, "EQ z" => Eq, Register(Z), 1, Fixed(1),
            /// EQ $ ; pop $1, $2; fx = $1 == $2
            EqStack = 0x85, "EQ $" => Eq, Stack, 1, Fixed(2),
            /// GT <Number> ; fx = A > n
            GtN = 0x86, "GT <Number>" => Gt, Immediate, 2, Fixed(2),
            /// GT x ; fx = A > x
            GtX = 0x87, "GT x" => Gt, Register(X), 1, Fixed(1),
            /// GT y ; fx = A > y
            GtY = 0x88, "GT y" => Gt, Register(Y), 1, Fixed(1),
            /// GT z ; fx = A > z
            GtZ = 0x89, "GT z" => Gt, Register(Z), 1, Fixed(1),
            /// GT $ ; pop $1, $2; fx = $1 > $2
            GtStack = 0x8A, "GT $" => Gt, Stack, 1, Fixed(2),
            /// LT <Number> ; fx = A < n
            LtN = 0x8B, "LT <Number>" => Lt, Immediate, 2, Fixed(2),
            /// LT x ; fx = A < x
            LtX = 0x8C, "LT x" => Lt, Register(X), 1, Fixed(1),
            /// LT y ; fx = A < y
            LtY = 0x8D, "LT y" => Lt, Register(Y), 1, Fixed(1),
            /// LT z ; fx = A < z
            LtZ = 0x8E, "LT z" => Lt, Register(Z), 1, Fixed(1),
            /// LT $ ; pop $1, $2; fx = $1 < $2
            LtStack = 0x8F, "LT $" => Lt, Stack, 1, Fixed(2),
            /// NEQ <Number> ; fx = A != n
            NeqN = 0x90, "NEQ <Number>" => Neq, Immediate, 2, Fixed(2),
            /// NEQ x ; fx = A != x
            NeqX = 0x91, "NEQ x" => Neq, Register(X), 1, Fixed(1),
            /// NEQ y ; fx = A != y
            NeqY = 0x92, "NEQ y" => Neq, Register(Y), 1, Fixed(1),
            /// NEQ z ; fx = A != z
            NeqZ = 0x93, "NEQ z" => Neq, Register(Z), 1, Fixed(1),
            /// NEQ $ ; pop $1, $2; fx = $1 != $2
            NeqStack = 0x94, "NEQ $" => Neq, Stack, 1, Fixed(2),
            /// NGT <Number> ; fx = A <= n
            NgtN = 0x95, "NGT <Number>" => Ngt, Immediate, 2, Fixed(2),
            /// NGT x ; fx = A <= x
            NgtX = 0x96, "NGT x" => Ngt, Register(X), 1, Fixed(1),
            /// NGT y ; fx = A <= y
            NgtY = 0x97, "NGT y" => Ngt, Register(Y), 1, Fixed(1),
            /// NGT z ; fx = A <= z
            NgtZ = 0x98, "NGT z" => Ngt, Register(Z), 1, Fixed(1),
            /// NGT $ ; pop $1, $2; fx = $1 <= $2
            NgtStack = 0x99, "NGT $" => Ngt, Stack, 1, Fixed(2),
            /// NLT <Number> ; fx = A >= n
            NltN = 0x9A, "NLT <Number>" => Nlt, Immediate, 2, Fixed(2),
            /// NLT x ; fx = A >= x
            NltX = 0x9B, "NLT x" => Nlt, Register(X), 1, Fixed(1),
            /// NLT y ; fx = A >= y
            NltY = 0x9C, "NLT y" => Nlt, Register(Y), 1, Fixed(1),
            /// NLT z ; fx = A >= z
            NltZ = 0x9D, "NLT z" => Nlt, Register(Z), 1, Fixed(1),
            /// NLT $ ; pop $1, $2; fx = $1 >= $2
            NltStack = 0x9E, "NLT $" => Nlt, Stack, 1, Fixed(2),
            // =========================
            // Unary
            // =========================
            /// CLZ ; A = count leading zeros of A
            Clz = 0x9F, "CLZ" => Clz, Implicit, 1, Fixed(1),
            /// CLZ $ ; pop $1; push leading zeros of $1; fx = BOOL
            ClzStack = 0xA0, "CLZ $" => Clz, Stack, 1, Fixed(3),
            /// CTZ ; A = count trailing zeros of A
            Ctz = 0xA1, "CTZ" => Ctz, Implicit, 1, Fixed(1),
            /// CTZ $ ; pop $1; push trailing zeros of $1; fx = BOOL
            CtzStack = 0xA2, "CTZ $" => Ctz, Stack, 1, Fixed(3),
            /// NSA ; A = population count of A
            Nsa = 0xA3, "NSA" => Nsa, Implicit, 1, Fixed(1),
            /// NSA $ ; pop $1; push population count of $1; fx = BOOL
            NsaStack = 0xA4, "NSA $" => Nsa, Stack, 1, Fixed(3),
            /// NOT ; A = bitwise not of A
            Not = 0xA5, "NOT" => Not, Implicit, 1, Fixed(1),
            /// NOT $ ; pop $1; push !$1; fx = BOOL
            NotStack = 0xA6, "NOT $" => Not, Stack, 1, Fixed(3),
            // =========================
            // Arithmetic
            // =========================
            /// INC ; A += 1
            Inc = 0xA7, "INC" => Inc, Implicit, 1, Fixed(1),
            /// INC x ; x += 1
            IncX = 0xA8, "INC x" => Inc, Register(X), 1, Fixed(1),
            /// INC y ; y += 1
            IncY = 0xA9, "INC y" => Inc, Register(Y), 1, Fixed(1),
            /// INC z ; z += 1
            IncZ = 0xAA, "INC z" => Inc, Register(Z), 1, Fixed(1),
            /// INC $ ; pop $1; push $1 + 1; fx = BOOL
            IncStack = 0xAB, "INC $" => Inc, Stack, 1, Fixed(3),
            /// DEC ; A -= 1
            Dec = 0xAC, "DEC" => Dec, Implicit, 1, Fixed(1),
            /// DEC x ; x -= 1
            DecX = 0xAD, "DEC x" => Dec, Register(X), 1, Fixed(1),
            /// DEC y ; y -= 1
            DecY = 0xAE, "DEC y" => Dec, Register(Y), 1, Fixed(1),
            /// DEC z ; z -= 1
            DecZ = 0xAF, "DEC z" => Dec, Register(Z), 1, Fixed(1),
            /// DEC $ ; pop $1; push $1 - 1; fx = BOOL
            DecStack = 0xB0, "DEC $" => Dec, Stack, 1, Fixed(3),
            /// ADD <Number> ; A += n, fx = carry
            AddN = 0xB1, "ADD <Number>" => Add, Immediate, 2, Fixed(2),
            /// ADD x ; A += x, fx = carry
            AddX = 0xB2, "ADD x" => Add, Register(X), 1, Fixed(1),
            /// ADD y ; A += y, fx = carry
            AddY = 0xB3, "ADD y" => Add, Register(Y), 1, Fixed(1),
            /// ADD z ; A += z, fx = carry
            AddZ = 0xB4, "ADD z" => Add, Register(Z), 1, Fixed(1),
            /// ADD $ ; pop $1, $2; push $1 + $2; fx = carry
            AddStack = 0xB5, "ADD $" => Add, Stack, 1, Fixed(3),
            /// SUB <Number> ; A -= n, fx = borrow
            SubN = 0xB6, "SUB <Number>" => Sub, Immediate, 2, Fixed(2),
            /// SUB x ; A -= x, fx = borrow
            SubX = 0xB7, "SUB x" => Sub, Register(X), 1, Fixed(1),
            /// SUB y ; A -= y, fx = borrow
            SubY = 0xB8, "SUB y" => Sub, Register(Y), 1, Fixed(1),
            /// SUB z ; A -= z, fx = borrow
            SubZ = 0xB9, "SUB z" => Sub, Register(Z), 1, Fixed(1),
            /// SUB $ ; pop $1, $2; push $1 - $2; fx = borrow
            SubStack = 0xBA, "SUB $" => Sub, Stack, 1, Fixed(3),
            /// TALLY <Number> ; A += n + carry, fx = carry
            TallyN = 0xBB, "TALLY <Number>" => Tally, Immediate, 2, Fixed(2),
            /// TALLY x ; A += x + carry, fx = carry
            TallyX = 0xBC, "TALLY x" => Tally, Register(X), 1, Fixed(1),
            /// TALLY y ; A += y + carry, fx = carry
            TallyY = 0xBD, "TALLY y" => Tally, Register(Y), 1, Fixed(1),
            /// TALLY z ; A += z + carry, fx = carry
            TallyZ = 0xBE, "TALLY z" => Tally, Register(Z), 1, Fixed(1),
            /// TALLY $ ; pop $1, $2; push $1 + $2 + fx; fx = carry
            TallyStack = 0xBF, "TALLY $" => Tally, Stack, 1, Fixed(3),
            /// DEBIT <Number> ; A -= n + borrow, fx = borrow
            DebitN = 0xC0, "DEBIT <Number>" => Debit, Immediate, 2, Fixed(2),
            /// DEBIT x ; A -= x + borrow, fx = borrow
            DebitX = 0xC1, "DEBIT x" => Debit, Register(X), 1, Fixed(1),
            /// DEBIT y ; A -= y + borrow, fx = borrow
            DebitY = 0xC2, "DEBIT y" => Debit, Register(Y), 1, Fixed(1),
            /// DEBIT z ; A -= z + borrow, fx = borrow
            DebitZ = 0xC3, "DEBIT z" => Debit, Register(Z), 1, Fixed(1),
            /// DEBIT $ ; pop $1, $2; push $1 - $2 - fx; fx = borrow
            DebitStack = 0xC4, "DEBIT $" => Debit, Stack, 1, Fixed(3),
            /// MUL <Number> ; A = low(A * n), fx = high
            MulN = 0xC5, "MUL <Number>" => Mul, Immediate, 2, Fixed(2),
            /// MUL x ; A = low(A * x), fx = high
            MulX = 0xC6, "MUL x" => Mul, Register(X), 1, Fixed(1),
            /// MUL y ; A = low(A * y), fx = high
            MulY = 0xC7, "MUL y" => Mul, Register(Y), 1, Fixed(1),
            /// MUL z ; A = low(A * z), fx = high
            MulZ = 0xC8, "MUL z" => Mul, Register(Z), 1, Fixed(1),
            /// MUL $ ; pop $1, $2; push low($1 * $2); fx = high
            MulStack = 0xC9, "MUL $" => Mul, Stack, 1, Fixed(3),
            /// DIV <Number> ; A = A / n, fx = remainder
            DivN = 0xCA, "DIV <Number>" => Div, Immediate, 2, Fixed(2),
            /// DIV x ; A = A / x, fx = remainder
            DivX = 0xCB, "DIV x" => Div, Register(X), 1, Fixed(1),
            /// DIV y ; A = A / y, fx = remainder
            DivY = 0xCC, "DIV y" => Div, Register(Y), 1, Fixed(1),
            /// DIV z ; A = A / z, fx = remainder
            DivZ = 0xCD, "DIV z" => Div, Register(Z), 1, Fixed(1),
            /// DIV $ ; pop $1, $2; push $1 / $2; fx = $1 % $2
            DivStack = 0xCE, "DIV $" => Div, Stack, 1, Fixed(3),
            /// MOD <Number> ; A = A % n, fx = quotient
            ModN = 0xCF, "MOD <Number>" => Mod, Immediate, 2, Fixed(2),
            /// MOD x ; A = A % x, fx = quotient
            ModX = 0xD0, "MOD x" => Mod, Register(X), 1, Fixed(1),
            /// MOD y ; A = A % y, fx = quotient
            ModY = 0xD1, "MOD y" => Mod, Register(Y), 1, Fixed(1),
            /// MOD z ; A = A % z, fx = quotient
            ModZ = 0xD2, "MOD z" => Mod, Register(Z), 1, Fixed(1),
            /// MOD $ ; pop $1, $2; push $1 % $2; fx = $1 / $2
            ModStack = 0xD3, "MOD $" => Mod, Stack, 1, Fixed(3),
            // =========================
            // Bitwise
            // =========================
            /// AND <Number> ; A &= n, fx = A
            AndN = 0xD4, "AND <Number>" => And, Immediate, 2, Fixed(2),
            /// AND x ; A &= x, fx = A
            AndX = 0xD5, "AND x" => And, Register(X), 1, Fixed(1),
            /// AND y ; A &= y, fx = A
            AndY = 0xD6, "AND y" => And, Register(Y), 1, Fixed(1),
            /// AND z ; A &= z, fx = A
            AndZ = 0xD7, "AND z" => And, Register(Z), 1, Fixed(1),
            /// AND $ ; pop $1, $2; push $1 & $2; fx = BOOL
            AndStack = 0xD8, "AND $" => And, Stack, 1, Fixed(3),
            /// OR <Number> ; A |= n, fx = A
            OrN = 0xD9, "OR <Number>" => Or, Immediate, 2, Fixed(2),
            /// OR x ; A |= x, fx = A
            OrX = 0xDA, "OR x" => Or, Register(X), 1, Fixed(1),
            /// OR y ; A |= y, fx = A
            OrY = 0xDB, "OR y" => Or, Register(Y), 1, Fixed(1),
            /// OR z ; A |= z, fx = A
            OrZ = 0xDC, "OR z" => Or, Register(Z), 1, Fixed(1),
            /// OR $ ; pop $1, $2; push $1 | $2; fx = BOOL
            OrStack = 0xDD, "OR $" => Or, Stack, 1, Fixed(3),
            /// XOR <Number> ; A ^= n, fx = A
            XorN = 0xDE, "XOR <Number>" => Xor, Immediate, 2, Fixed(2),
            /// XOR x ; A ^= x, fx = A
            XorX = 0xDF, "XOR x" => Xor, Register(X), 1, Fixed(1),
            /// XOR y ; A ^= y, fx = A
            XorY = 0xE0, "XOR y" => Xor, Register(Y), 1, Fixed(1),
            /// XOR z ; A ^= z, fx = A
            XorZ = 0xE1, "XOR z" => Xor, Register(Z), 1, Fixed(1),
            /// XOR $ ; pop $1, $2; push $1 ^ $2; fx = BOOL
            XorStack = 0xE2, "XOR $" => Xor, Stack, 1, Fixed(3),
            /// ZSH <Number> ; A >>= n, fx = BOOL
            ZshN = 0xE3, "ZSH <Number>" => Zsh, Immediate, 2, Fixed(2),
            /// ZSH x ; A >>= x, fx = BOOL
            ZshX = 0xE4, "ZSH x" => Zsh, Register(X), 1, Fixed(1),
            /// ZSH y ; A >>= y, fx = BOOL
            ZshY = 0xE5, "ZSH y" => Zsh, Register(Y), 1, Fixed(1),
            /// ZSH z ; A >>= z, fx = BOOL
            ZshZ = 0xE6, "ZSH z" => Zsh, Register(Z), 1, Fixed(1),
            /// ZSH $ ; pop $1, $2; push $1 >> $2; fx = BOOL
            ZshStack = 0xE7, "ZSH $" => Zsh, Stack, 1, Fixed(3),
            /// SSH <Number> ; A = A +> n, fx = BOOL
            SshN = 0xE8, "SSH <Number>" => Ssh, Immediate, 2, Fixed(2),
            /// SSH x ; A = A +> x, fx = BOOL
            SshX = 0xE9, "SSH x" => Ssh, Register(X), 1, Fixed(1),
            /// SSH y ; A = A +> y, fx = BOOL
            SshY = 0xEA, "SSH y" => Ssh, Register(Y), 1, Fixed(1),
            /// SSH z ; A = A +> z, fx = BOOL
            SshZ = 0xEB, "SSH z" => Ssh, Register(Z), 1, Fixed(1),
            /// SSH $ ; pop $1, $2; push $1 +> $2; fx = BOOL
            SshStack = 0xEC, "SSH $" => Ssh, Stack, 1, Fixed(3),
            /// LSH <Number> ; A <<= n, fx = BOOL
            LshN = 0xED, "LSH <Number>" => Lsh, Immediate, 2, Fixed(2),
            /// LSH x ; A <<= x, fx = BOOL
            LshX = 0xEE, "LSH x" => Lsh, Register(X), 1, Fixed(1),
            /// LSH y ; A <<= y, fx = BOOL
            LshY = 0xEF, "LSH y" => Lsh, Register(Y), 1, Fixed(1),
            /// LSH z ; A <<= z, fx = BOOL
            LshZ = 0xF0, "LSH z" => Lsh, Register(Z), 1, Fixed(1),
            /// LSH $ ; pop $1, $2; push $1 << $2; fx = BOOL
            LshStack = 0xF1, "LSH $" => Lsh, Stack, 1, Fixed(3),
            /// ROT <Number> ; A = A >>> n, fx = BOOL
            RotN = 0xF2, "ROT <Number>" => Rot, Immediate, 2, Fixed(2),
            /// ROT x ; A = A >>> x, fx = BOOL
            RotX = 0xF3, "ROT x" => Rot, Register(X), 1, Fixed(1),
            /// ROT y ; A = A >>> y, fx = BOOL
            RotY = 0xF4, "ROT y" => Rot, Register(Y), 1, Fixed(1),
            /// ROT z ; A = A >>> z, fx = BOOL
            RotZ = 0xF5, "ROT z" => Rot, Register(Z), 1, Fixed(1),
            /// ROT $ ; pop $1, $2; push $1 >>> $2; fx = BOOL
            RotStack = 0xF6, "ROT $" => Rot, Stack, 1, Fixed(3),
        }
    };
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $syntax:literal => $op:ident,
            $mode:ident $( ( $reg:ident ) )?, $len:literal, $cycles:ident ( $( $c:literal ),+ )
        ),* $(,)?
    ) => {
        /// Every ZEN_80 opcode, discriminant = opcode byte.
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Instruction {
            type Error = Fault;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Instruction::$name), )*
                    _ => Err(Fault::InvalidInstruction {
                        opcode: value,
                        address: 0,
                    }),
                }
            }
        }

        impl Instruction {
            /// All instructions in opcode order.
            pub const ALL: &'static [Instruction] = &[ $( Instruction::$name, )* ];

            /// Returns the canonical syntax, e.g. `LOAD [<Number> x]`.
            pub const fn syntax(&self) -> &'static str {
                match self {
                    $( Instruction::$name => $syntax, )*
                }
            }

            /// Returns the operation this instruction performs.
            pub const fn operation(&self) -> Operation {
                match self {
                    $( Instruction::$name => Operation::$op, )*
                }
            }

            /// Returns the addressing mode.
            pub const fn mode(&self) -> Mode {
                match self {
                    $( Instruction::$name => Mode::$mode $( (Register::$reg) )?, )*
                }
            }

            /// Returns the encoded length in bytes.
            pub const fn size(&self) -> usize {
                match self {
                    $( Instruction::$name => $len, )*
                }
            }

            /// Returns the cycle cost record.
            pub const fn cycles(&self) -> Cycles {
                match self {
                    $( Instruction::$name => Cycles::$cycles( $( $c ),+ ), )*
                }
            }

            /// Looks an instruction up by its canonical syntax.
            pub fn from_syntax(syntax: &str) -> Option<Instruction> {
                match syntax {
                    $( $syntax => Some(Instruction::$name), )*
                    _ => None,
                }
            }
        }
    };
}

for_each_instruction!(define_instructions);

/// Number of defined opcodes.
pub const OPCODE_COUNT: usize = Instruction::ALL.len();

impl Instruction {
    /// Returns the mnemonic, the first word of the syntax.
    pub fn mnemonic(&self) -> &'static str {
        self.operation().mnemonic()
    }
}

/// What an instruction does, independent of its addressing mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    Done,
    Halt,
    Nuke,
    Noop,
    Return,
    Jump,
    Fork,
    Else,
    Call,
    Race,
    Poke,
    Lock,
    Free,
    Read,
    Write,
    Address,
    Execute,
    Operate,
    Set,
    Reset,
    Copy,
    Sync,
    Load,
    Store,
    Push,
    Pop,
    Drop,
    Dupe,
    Swap,
    Peek,
    Void,
    Pack,
    Pass,
    Dump,
    Poll,
    Eq,
    Gt,
    Lt,
    Neq,
    Ngt,
    Nlt,
    Clz,
    Ctz,
    Nsa,
    Not,
    Inc,
    Dec,
    Add,
    Sub,
    Tally,
    Debit,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Zsh,
    Ssh,
    Lsh,
    Rot,
}

impl Operation {
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Operation::Done => "DONE",
            Operation::Halt => "HALT",
            Operation::Nuke => "NUKE",
            Operation::Noop => "NOOP",
            Operation::Return => "RETURN",
            Operation::Jump => "JUMP",
            Operation::Fork => "FORK",
            Operation::Else => "ELSE",
            Operation::Call => "CALL",
            Operation::Race => "RACE",
            Operation::Poke => "POKE",
            Operation::Lock => "LOCK",
            Operation::Free => "FREE",
            Operation::Read => "READ",
            Operation::Write => "WRITE",
            Operation::Address => "ADDRESS",
            Operation::Execute => "EXECUTE",
            Operation::Operate => "OPERATE",
            Operation::Set => "SET",
            Operation::Reset => "RESET",
            Operation::Copy => "COPY",
            Operation::Sync => "SYNC",
            Operation::Load => "LOAD",
            Operation::Store => "STORE",
            Operation::Push => "PUSH",
            Operation::Pop => "POP",
            Operation::Drop => "DROP",
            Operation::Dupe => "DUPE",
            Operation::Swap => "SWAP",
            Operation::Peek => "PEEK",
            Operation::Void => "VOID",
            Operation::Pack => "PACK",
            Operation::Pass => "PASS",
            Operation::Dump => "DUMP",
            Operation::Poll => "POLL",
            Operation::Eq => "EQ",
            Operation::Gt => "GT",
            Operation::Lt => "LT",
            Operation::Neq => "NEQ",
            Operation::Ngt => "NGT",
            Operation::Nlt => "NLT",
            Operation::Clz => "CLZ",
            Operation::Ctz => "CTZ",
            Operation::Nsa => "NSA",
            Operation::Not => "NOT",
            Operation::Inc => "INC",
            Operation::Dec => "DEC",
            Operation::Add => "ADD",
            Operation::Sub => "SUB",
            Operation::Tally => "TALLY",
            Operation::Debit => "DEBIT",
            Operation::Mul => "MUL",
            Operation::Div => "DIV",
            Operation::Mod => "MOD",
            Operation::And => "AND",
            Operation::Or => "OR",
            Operation::Xor => "XOR",
            Operation::Zsh => "ZSH",
            Operation::Ssh => "SSH",
            Operation::Lsh => "LSH",
            Operation::Rot => "ROT",
        }
    }

    pub const fn group(&self) -> Group {
        use Operation::*;
        match self {
            Done | Halt | Nuke | Noop | Return | Jump | Fork | Else | Call | Race | Poke | Lock
            | Free => Group::Control,
            Read | Write | Address | Execute | Operate => Group::Block,
            Set | Reset | Copy | Sync | Load | Store => Group::Register,
            Push | Pop | Drop | Dupe | Swap | Peek | Void => Group::Stack,
            Pack | Pass | Dump | Poll => Group::Pipe,
            Eq | Gt | Lt | Neq | Ngt | Nlt => Group::Comparison,
            Clz | Ctz | Nsa | Not => Group::Unary,
            Inc | Dec | Add | Sub | Tally | Debit | Mul | Div | Mod => Group::Arithmetic,
            And | Or | Xor | Zsh | Ssh | Lsh | Rot => Group::Bitwise,
        }
    }
}

/// Number of groups tracked by the cycle profile.
pub const GROUP_COUNT: usize = 9;

/// Instruction groups, in table order.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Group {
    Control = 0,
    Block = 1,
    Register = 2,
    Stack = 3,
    Pipe = 4,
    Comparison = 5,
    Unary = 6,
    Arithmetic = 7,
    Bitwise = 8,
}

impl Group {
    pub const ALL: [Group; GROUP_COUNT] = [
        Group::Control,
        Group::Block,
        Group::Register,
        Group::Stack,
        Group::Pipe,
        Group::Comparison,
        Group::Unary,
        Group::Arithmetic,
        Group::Bitwise,
    ];

    /// Section heading used by the opcode listing.
    pub const fn heading(&self) -> &'static str {
        match self {
            Group::Control => "CONTROL FLOW INSTRUCTIONS",
            Group::Block => "BLOCK INSTRUCTIONS",
            Group::Register => "REGISTER INSTRUCTIONS",
            Group::Stack => "STACK INSTRUCTIONS",
            Group::Pipe => "PIPE INSTRUCTIONS",
            Group::Comparison => "COMPARISON OPERATIONS",
            Group::Unary => "UNARY OPERATIONS",
            Group::Arithmetic => "BINARY ARITHMETIC OPERATIONS",
            Group::Bitwise => "BINARY BITWISE OPERATIONS",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Group::Control => "Control",
            Group::Block => "Block",
            Group::Register => "Register",
            Group::Stack => "Stack",
            Group::Pipe => "Pipe",
            Group::Comparison => "Comparison",
            Group::Unary => "Unary",
            Group::Arithmetic => "Arithmetic",
            Group::Bitwise => "Bitwise",
        }
    }
}

/// Cycle cost of one instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cycles {
    /// Same cost in both streams.
    Fixed(u8),
    /// `(code stream, pipe stream)`.
    Piped(u8, u8),
    /// Base cost plus one per started 8-byte block.
    Block(u8),
}

impl Cycles {
    /// Resolves the cost for the stream the instruction was fetched from and
    /// the block length in A.
    pub const fn resolve(&self, in_pipe: bool, block_len: u8) -> u64 {
        match *self {
            Cycles::Fixed(n) => n as u64,
            Cycles::Piped(code, pipe) => {
                if in_pipe {
                    pipe as u64
                } else {
                    code as u64
                }
            }
            Cycles::Block(base) => base as u64 + blocks(block_len as usize) as u64,
        }
    }

    /// Text used by the opcode listing, e.g. `1`, `1/2`, `1+`.
    pub fn describe(&self) -> String {
        match self {
            Cycles::Fixed(n) => n.to_string(),
            Cycles::Piped(code, pipe) => format!("{code}/{pipe}"),
            Cycles::Block(base) => format!("{base}+"),
        }
    }

    /// Stable byte encoding, used to fingerprint the table.
    pub const fn encode(&self) -> [u8; 3] {
        match *self {
            Cycles::Fixed(n) => [0, n, n],
            Cycles::Piped(code, pipe) => [1, code, pipe],
            Cycles::Block(base) => [2, base, 0],
        }
    }
}
