//! Small plans shared by unit tests.

use super::Plan;

pub(crate) const SMALL_PLAN: &str = r#"
[plan]
title = "Small Plan"
start_date = "2026-01-15"

[[phases]]
id = "alpha"
title = "Alpha"
months = [0, 1]
mode = "learning-heavy"

[[phases]]
id = "beta"
title = "Beta"
months = [2]
mode = "building-heavy"

[[months]]
number = 0
title = "Month Zero"
mode = "learning-heavy"
exit_criteria = ["ship the thing"]
failure_risk = "skipping basics"

[[months.weeks]]
number = 0

[[months.weeks.actions]]
id = "a1"
lane = "core-build"
description = "Build the first thing"
effort_hours = 4.0
ai_policy = "forbidden"
output_artifact = "thing.rs"

[[months.weeks.actions]]
id = "a2"
lane = "reasoning"
description = "Reason about it"
effort_hours = 2.5
ai_policy = "coach-only"

[[months.weeks]]
number = 1
prerequisites = ["thing.rs"]

[[months.weeks.actions]]
id = "a3"
lane = "deliverables"
description = "Demo the thing"
effort_hours = 3.0
ai_policy = "allowed"
output_artifact = "demo"
anchor = true

[[months]]
number = 1
title = "Month One"
mode = "building-heavy"

[[months.weeks]]
number = 2

[[months.weeks.actions]]
id = "a4"
lane = "design"
description = "Design the next thing"
effort_hours = 6.0
ai_policy = "coach-only"

[[months]]
number = 2
title = "Month Two"
mode = "building-heavy"

[[months.weeks]]
number = 3
"#;

/// Two phases, three months, four weeks, four actions; the last week is empty.
pub(crate) fn small_plan() -> Plan {
    Plan::from_toml_str(SMALL_PLAN).unwrap()
}
