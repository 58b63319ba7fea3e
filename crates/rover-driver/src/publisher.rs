//! 动作事件发布
//!
//! 运动线程和显示线程之间唯一的耦合：一个无界 FIFO。
//! 发送永不阻塞；显示线程退出后事件被丢弃，不影响运动。

use crossbeam_channel::{Receiver, Sender, unbounded};
use rover_protocol::{ActionEvent, ActionKind};
use tracing::{debug, trace};

/// 创建动作事件通道
///
/// # 示例
///
/// ```
/// use rover_driver::action_channel;
/// use rover_protocol::{ActionEvent, ActionKind};
///
/// let (publisher, rx) = action_channel();
/// publisher.publish(ActionEvent::new(ActionKind::Forward, 1.5));
/// assert_eq!(rx.try_recv().unwrap().kind, ActionKind::Forward);
/// ```
pub fn action_channel() -> (ActionPublisher, Receiver<ActionEvent>) {
    let (tx, rx) = unbounded();
    (ActionPublisher { tx }, rx)
}

/// 动作事件发布端（可克隆，多生产者）
#[derive(Debug, Clone)]
pub struct ActionPublisher {
    tx: Sender<ActionEvent>,
}

impl ActionPublisher {
    /// 没有消费者的发布端（事件直接丢弃）
    pub fn detached() -> Self {
        let (publisher, _rx) = action_channel();
        publisher
    }

    /// 发布事件
    ///
    /// 返回事件是否进入队列（消费者已退出时返回 `false`）。
    pub fn publish(&self, event: ActionEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => {
                trace!("Published {:?} for {:.3}s", event.kind, event.duration_s);
                true
            },
            Err(_) => {
                debug!("No display consumer, dropped {:?} event", event.kind);
                false
            },
        }
    }

    /// 发布无限时长的空闲事件
    pub fn publish_idle(&self) -> bool {
        self.publish(ActionEvent::idle())
    }

    /// 发布障碍动画事件
    pub fn publish_obstacle(&self, duration_s: f64) -> bool {
        self.publish(ActionEvent::new(ActionKind::Obstacle, duration_s))
    }

    /// 队列中尚未消费的事件数
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let (publisher, rx) = action_channel();
        publisher.publish(ActionEvent::new(ActionKind::Left, 0.3));
        publisher.publish_obstacle(2.0);
        publisher.publish_idle();

        assert_eq!(publisher.pending(), 3);
        let kinds: Vec<_> = rx.try_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::Left, ActionKind::Obstacle, ActionKind::Idle]
        );
    }

    #[test]
    fn test_detached_drops_silently() {
        let publisher = ActionPublisher::detached();
        assert!(!publisher.publish_idle());
    }

    #[test]
    fn test_multiple_producers() {
        let (publisher, rx) = action_channel();
        let other = publisher.clone();

        std::thread::spawn(move || {
            other.publish(ActionEvent::new(ActionKind::Dance, 3.0));
        })
        .join()
        .unwrap();
        publisher.publish(ActionEvent::new(ActionKind::Greet, 1.0));

        assert_eq!(rx.len(), 2);
    }
}
