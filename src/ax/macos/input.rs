//! CGEvent 输入驱动
//!
//! 通过 CGEventPost(HID) 发送鼠标与键盘事件，目标窗口需已在前台。

use crate::ax::error::{AxError, AxResult};
use crate::ax::input::InputDriver;
use crate::ax::value::Point;
use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;
use std::thread::sleep;
use std::time::Duration;
use tracing::debug;

/// 动画每步间隔
const STEP_INTERVAL: Duration = Duration::from_millis(10);
/// 按下与抬起之间的间隔
const PRESS_INTERVAL: Duration = Duration::from_millis(50);
const KEY_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
pub struct CgEventInput;

impl CgEventInput {
    pub fn new() -> Self {
        Self
    }

    fn source() -> AxResult<CGEventSource> {
        CGEventSource::new(CGEventSourceStateID::Private)
            .map_err(|_| AxError::Other("Failed to create CGEventSource".to_string()))
    }

    /// 当前指针位置
    fn cursor() -> AxResult<Point> {
        let event = CGEvent::new(Self::source()?)
            .map_err(|_| AxError::Other("Failed to read cursor location".to_string()))?;
        let location = event.location();
        Ok(Point::new(location.x, location.y))
    }

    fn post_mouse(event_type: CGEventType, point: Point) -> AxResult<()> {
        let event = CGEvent::new_mouse_event(
            Self::source()?,
            event_type,
            CGPoint::new(point.x, point.y),
            CGMouseButton::Left,
        )
        .map_err(|_| AxError::Other("Failed to create mouse event".to_string()))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }

    /// 从当前位置按直线插值移动到 `to`
    fn animate(event_type: CGEventType, to: Point, duration: Duration) -> AxResult<()> {
        let from = Self::cursor()?;
        let steps = (duration.as_millis() / STEP_INTERVAL.as_millis()).max(1) as u32;
        for step in 1..=steps {
            let t = f64::from(step) / f64::from(steps);
            let point = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
            Self::post_mouse(event_type, point)?;
            if step < steps {
                sleep(STEP_INTERVAL);
            }
        }
        Ok(())
    }
}

impl InputDriver for CgEventInput {
    fn move_to(&mut self, point: Point, duration: Duration) -> AxResult<()> {
        debug!("move_to ({:.0},{:.0}) over {:?}", point.x, point.y, duration);
        Self::animate(CGEventType::MouseMoved, point, duration)
    }

    fn click(&mut self, point: Point) -> AxResult<()> {
        debug!("click ({:.0},{:.0})", point.x, point.y);
        Self::post_mouse(CGEventType::LeftMouseDown, point)?;
        sleep(PRESS_INTERVAL);
        Self::post_mouse(CGEventType::LeftMouseUp, point)
    }

    fn drag_to(&mut self, point: Point, duration: Duration) -> AxResult<()> {
        let start = Self::cursor()?;
        debug!(
            "drag ({:.0},{:.0}) -> ({:.0},{:.0})",
            start.x, start.y, point.x, point.y
        );
        Self::post_mouse(CGEventType::LeftMouseDown, start)?;
        sleep(PRESS_INTERVAL);
        Self::animate(CGEventType::LeftMouseDragged, point, duration)?;
        Self::post_mouse(CGEventType::LeftMouseUp, point)
    }

    fn type_text(&mut self, text: &str, target: Option<i32>) -> AxResult<()> {
        let source = Self::source()?;
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let s = ch.encode_utf8(&mut buf);
            for key_down in [true, false] {
                // keycode 0 占位，实际字符由 set_string 提供
                let event = CGEvent::new_keyboard_event(source.clone(), 0, key_down)
                    .map_err(|_| AxError::Other("Failed to create key event".to_string()))?;
                event.set_string(s);
                match target {
                    Some(pid) => event.post_to_pid(pid),
                    None => event.post(CGEventTapLocation::HID),
                }
            }
            sleep(KEY_INTERVAL);
        }
        debug!("Typed {} chars", text.chars().count());
        Ok(())
    }
}
