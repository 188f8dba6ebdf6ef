/// Spins while `$condition` holds, giving up after `$budget` extra polls.
///
/// Evaluates to `Some(polls)` once the condition is false and to `None` when the
/// budget runs out first. The condition may use `?`.
macro_rules! block_while {
    ($budget:expr, $condition:expr) => {{
        let budget: u32 = $budget;
        let mut polls: u32 = 0;
        loop {
            if !($condition) {
                break Some(polls);
            }
            if polls >= budget {
                break None;
            }
            polls += 1;
            core::hint::spin_loop();
        }
    }};
}

macro_rules! block_until {
    ($budget:expr, $condition:expr) => {
        block_while!($budget, !($condition))
    };
}
