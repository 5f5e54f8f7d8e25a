//! MCP (Model Context Protocol) server for the readout simulation.
//!
//! Exposes the board as a JSON-RPC 2.0 server over stdin/stdout, so
//! scripts and agents can boot it, step it, inject temperatures and
//! inspect any state path programmatically.

use std::io::{self, BufRead, Write};

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use sense_core::{Observable, Tickable};

use crate::config::TempSenseConfig;
use crate::{TempSense, decode};

// ---------------------------------------------------------------------------
// JSON-RPC types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: JsonValue,
    id: JsonValue,
}

fn success(id: JsonValue, result: JsonValue) -> JsonValue {
    json!({ "jsonrpc": "2.0", "result": result, "id": id })
}

fn failure(id: JsonValue, code: i32, message: String) -> JsonValue {
    json!({ "jsonrpc": "2.0", "error": { "code": code, "message": message }, "id": id })
}

// ---------------------------------------------------------------------------
// Parameter shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct BootParams {
    #[serde(default)]
    clock_hz: Option<u64>,
    #[serde(default)]
    bus_hz: Option<u64>,
    #[serde(default)]
    trigger_hz: Option<u64>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    sensor: Option<bool>,
    #[serde(default)]
    stretch: Option<u32>,
}

#[derive(Deserialize)]
struct StepParams {
    count: u64,
}

#[derive(Deserialize)]
struct ReadParams {
    #[serde(default)]
    max_ticks: Option<u64>,
}

#[derive(Deserialize)]
struct SetTemperatureParams {
    celsius: f64,
}

#[derive(Deserialize)]
struct QueryParams {
    path: String,
}

// ---------------------------------------------------------------------------
// MCP server
// ---------------------------------------------------------------------------

/// MCP server wrapping a headless board instance.
pub struct McpServer {
    board: Option<TempSense>,
}

impl McpServer {
    #[must_use]
    pub fn new() -> Self {
        Self { board: None }
    }

    /// Run the server loop: read JSON-RPC from stdin, write responses
    /// to stdout.
    pub fn run(&mut self) {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<RpcRequest>(line) {
                Ok(request) if request.jsonrpc == "2.0" => {
                    self.dispatch(&request.method, &request.params, request.id)
                }
                Ok(request) => failure(
                    request.id,
                    -32600,
                    "Invalid JSON-RPC version".to_string(),
                ),
                Err(e) => failure(JsonValue::Null, -32700, format!("Parse error: {e}")),
            };
            let _ = writeln!(
                stdout,
                "{}",
                serde_json::to_string(&response).unwrap_or_default()
            );
            let _ = stdout.flush();
        }
    }

    fn dispatch(&mut self, method: &str, params: &JsonValue, id: JsonValue) -> JsonValue {
        match method {
            "boot" => self.handle_boot(params, id),
            "reset" => self.handle_reset(id),
            "step_ticks" => self.handle_step_ticks(params, id),
            "trigger" => self.handle_trigger(id),
            "read_temperature" => self.handle_read_temperature(params, id),
            "set_temperature" => self.handle_set_temperature(params, id),
            "query" => self.handle_query(params, id),
            "query_paths" => self.handle_query_paths(id),
            other => failure(id, -32601, format!("Method not found: {other}")),
        }
    }

    fn board_or_error(&mut self, id: &JsonValue) -> Result<&mut TempSense, JsonValue> {
        self.board
            .as_mut()
            .ok_or_else(|| failure(id.clone(), -32000, "Not booted".to_string()))
    }

    fn handle_boot(&mut self, params: &JsonValue, id: JsonValue) -> JsonValue {
        let p: BootParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return failure(id, -32602, format!("Invalid params: {e}")),
        };

        let mut config = TempSenseConfig::default();
        if let Some(hz) = p.clock_hz {
            config.clock = sense_core::MasterClock::new(hz);
        }
        if let Some(hz) = p.bus_hz {
            config.bus_hz = hz;
        }
        if let Some(hz) = p.trigger_hz {
            config.trigger_hz = hz;
        }
        if let Some(present) = p.sensor {
            config.sensor_present = present;
        }
        if let Some(ticks) = p.stretch {
            config.sensor_stretch = ticks;
        }

        let mut board = match TempSense::new(&config) {
            Ok(board) => board,
            Err(e) => return failure(id, -32602, e.to_string()),
        };
        if let (Some(celsius), Some(sensor)) = (p.temperature, board.sensor_mut()) {
            sensor.set_temperature(celsius);
        }
        self.board = Some(board);
        success(id, json!({ "booted": true }))
    }

    fn handle_reset(&mut self, id: JsonValue) -> JsonValue {
        match self.board_or_error(&id) {
            Ok(board) => {
                board.reset();
                success(id, json!({ "reset": true }))
            }
            Err(e) => e,
        }
    }

    fn handle_step_ticks(&mut self, params: &JsonValue, id: JsonValue) -> JsonValue {
        let p: StepParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return failure(id, -32602, format!("Invalid params: {e}")),
        };
        match self.board_or_error(&id) {
            Ok(board) => {
                for _ in 0..p.count {
                    board.tick();
                }
                success(id, json!({ "master_clock": board.master_clock() }))
            }
            Err(e) => e,
        }
    }

    fn handle_trigger(&mut self, id: JsonValue) -> JsonValue {
        match self.board_or_error(&id) {
            Ok(board) => {
                board.trigger_now();
                success(id, json!({ "triggered": true }))
            }
            Err(e) => e,
        }
    }

    fn handle_read_temperature(&mut self, params: &JsonValue, id: JsonValue) -> JsonValue {
        let p: ReadParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return failure(id, -32602, format!("Invalid params: {e}")),
        };
        let max_ticks = p.max_ticks.unwrap_or(100_000_000);
        match self.board_or_error(&id) {
            Ok(board) => {
                board.trigger_now();
                match board.run_until_reading(max_ticks) {
                    Some(raw) => success(
                        id,
                        json!({
                            "raw": raw,
                            "millicelsius": decode::millicelsius(raw),
                            "display": decode::format(raw),
                            "ack_failed": board.ack_failed(),
                        }),
                    ),
                    None => failure(id, -32001, "No reading within tick budget".to_string()),
                }
            }
            Err(e) => e,
        }
    }

    fn handle_set_temperature(&mut self, params: &JsonValue, id: JsonValue) -> JsonValue {
        let p: SetTemperatureParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return failure(id, -32602, format!("Invalid params: {e}")),
        };
        match self.board_or_error(&id) {
            Ok(board) => match board.sensor_mut() {
                Some(sensor) => {
                    sensor.set_temperature(p.celsius);
                    success(id, json!({ "celsius": p.celsius }))
                }
                None => failure(id, -32000, "No sensor on the bus".to_string()),
            },
            Err(e) => e,
        }
    }

    fn handle_query(&mut self, params: &JsonValue, id: JsonValue) -> JsonValue {
        let p: QueryParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return failure(id, -32602, format!("Invalid params: {e}")),
        };
        match self.board_or_error(&id) {
            Ok(board) => match board.query(&p.path) {
                Some(value) => success(id, json!({ "value": value.to_string() })),
                None => failure(id, -32602, format!("Unknown path: {}", p.path)),
            },
            Err(e) => e,
        }
    }

    fn handle_query_paths(&mut self, id: JsonValue) -> JsonValue {
        match self.board_or_error(&id) {
            Ok(board) => success(id, json!({ "paths": board.query_paths() })),
            Err(e) => e,
        }
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}
