fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped < -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Yaw whose forward vector points along `(dx, dz)`.
fn yaw_towards(dx: f32, dz: f32) -> f32 {
    (-dx).atan2(-dz)
}

fn seconds_to_ticks(seconds: f32, tick_seconds: f32) -> u32 {
    if tick_seconds <= 0.0 || !seconds.is_finite() {
        return 1;
    }
    ((seconds / tick_seconds).round() as u32).max(1)
}

/// `hold <action>[+<action>] <seconds>`, `press <edge>`, `wait <seconds>`;
/// blank lines and `#` comments are skipped.
fn parse_script(raw: &str, tick_seconds: f32) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (offset, line) in raw.lines().enumerate() {
        let line_no = offset + 1;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let parse_error = |message: String| ScriptError::Parse {
            line: line_no,
            message,
        };
        let words: Vec<&str> = content.split_whitespace().collect();
        let step = match words.as_slice() {
            ["hold", actions, seconds] => {
                let mut input = InputSnapshot::empty();
                for name in actions.split('+') {
                    let action = InputAction::from_name(name)
                        .ok_or_else(|| parse_error(format!("unknown action `{name}`")))?;
                    input = input.with_action_down(action, true);
                }
                ScriptStep::Hold {
                    input,
                    ticks: seconds_to_ticks(parse_seconds(seconds).map_err(parse_error)?, tick_seconds),
                }
            }
            ["press", edge] => ScriptStep::Press(
                InputEdge::from_name(edge)
                    .ok_or_else(|| parse_error(format!("unknown edge `{edge}`")))?,
            ),
            ["wait", seconds] => ScriptStep::Wait {
                ticks: seconds_to_ticks(parse_seconds(seconds).map_err(parse_error)?, tick_seconds),
            },
            _ => return Err(parse_error(format!("unrecognized command `{content}`"))),
        };
        steps.push(step);
    }
    Ok(steps)
}

fn parse_seconds(raw: &str) -> Result<f32, String> {
    match raw.parse::<f32>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(format!("invalid duration `{raw}`")),
    }
}

fn parse_csv_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}
