use bolero::check;
use mail_bounce_detector::{detect, Message};

fn main() {
    check!().for_each(|data: &[u8]| {
        if let Ok(message) = Message::from_bytes(data) {
            let result = detect(&message);
            assert!(!(result.is_hard() && result.is_soft()));
            if !result.is_bounce() {
                assert_eq!(result.primary_status, None);
            }
        }
    });
}
