/// SQL schema for the Quill database
/// Creates all tables with proper constraints, foreign keys, and indexes
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    bio TEXT,
    join_date TEXT NOT NULL
);

-- One-to-one user profiles
CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    bio TEXT,
    picture TEXT,
    website TEXT,
    location TEXT,
    birth_date TEXT,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Catalog: authors own books one-to-many
CREATE TABLE IF NOT EXISTS authors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author_id TEXT NOT NULL,
    publication_year INTEGER NOT NULL,
    FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id);
CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);

-- Blog posts
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    title TEXT NOT NULL CHECK(length(title) <= 200),
    content TEXT NOT NULL,
    published_date TEXT NOT NULL,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_published_date ON posts(published_date DESC);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);

-- Tags table (unique tag names)
CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY,
    name TEXT UNIQUE NOT NULL
);

-- Post-tag junction table
CREATE TABLE IF NOT EXISTS post_tags (
    post_id TEXT NOT NULL,
    tag_id TEXT NOT NULL,
    PRIMARY KEY (post_id, tag_id),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_post_tags_post ON post_tags(post_id);
CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags(tag_id);

-- Comments (self-referential for threaded replies)
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    content TEXT NOT NULL,
    parent_comment_id TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (parent_comment_id) REFERENCES comments(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_comment_id);

-- Likes table (unique per user/post pair)
CREATE TABLE IF NOT EXISTS likes (
    user_id TEXT NOT NULL,
    post_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, post_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id);

-- Follows table (one-way relationships)
CREATE TABLE IF NOT EXISTS follows (
    follower_id TEXT NOT NULL,
    following_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (follower_id, following_id),
    FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (following_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id);
CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id);

-- Notifications created as side effects of likes
CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    recipient_id TEXT NOT NULL,
    actor_id TEXT NOT NULL,
    verb TEXT NOT NULL,
    target_kind TEXT NOT NULL,
    target_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (recipient_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (actor_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id);

-- Session tokens for authentication
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

/// Seed data for development and testing
/// Includes three users, a small catalog, posts with tags, threaded
/// comments, and one follow edge. Seeded users carry an unusable
/// password hash; authenticated flows in tests go through /accounts/register.
pub const TEST_DATA: &str = r#"
-- Seed users
INSERT OR IGNORE INTO users (id, username, email, password_hash, bio, join_date) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', 'alice', 'alice@example.com', 'unusable', 'Reads everything', '2024-01-01T00:00:00Z'),
    ('550e8400-e29b-41d4-a716-446655440002', 'bob', 'bob@example.com', 'unusable', 'Writes sometimes', '2024-01-02T00:00:00Z'),
    ('550e8400-e29b-41d4-a716-446655440003', 'charlie', 'charlie@example.com', 'unusable', NULL, '2024-01-03T00:00:00Z');

INSERT OR IGNORE INTO profiles (user_id, bio, picture, website, location, birth_date) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', 'Reads everything', NULL, 'https://alice.example.com', 'Lagos', '1990-04-12'),
    ('550e8400-e29b-41d4-a716-446655440002', 'Writes sometimes', NULL, NULL, NULL, NULL),
    ('550e8400-e29b-41d4-a716-446655440003', NULL, NULL, NULL, NULL, NULL);

-- Seed catalog: two books from 2023, one from 2021
INSERT OR IGNORE INTO authors (id, name) VALUES
    ('150e8400-e29b-41d4-a716-446655440001', 'Chinua Achebe'),
    ('150e8400-e29b-41d4-a716-446655440002', 'Ngugi wa Thiongo');

INSERT OR IGNORE INTO books (id, title, author_id, publication_year) VALUES
    ('250e8400-e29b-41d4-a716-446655440001', 'Arrow of God', '150e8400-e29b-41d4-a716-446655440001', 2023),
    ('250e8400-e29b-41d4-a716-446655440002', 'Things Fall Apart', '150e8400-e29b-41d4-a716-446655440001', 2021),
    ('250e8400-e29b-41d4-a716-446655440003', 'Petals of Blood', '150e8400-e29b-41d4-a716-446655440002', 2023);

-- Seed posts
INSERT OR IGNORE INTO posts (id, author_id, title, content, published_date) VALUES
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', 'Hello world', 'First post on the new platform.', '2024-02-01T10:00:00Z'),
    ('650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440002', 'On reading', 'Notes from this month''s reading list.', '2024-02-03T09:00:00Z'),
    ('650e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', 'A quiet start', 'Trying out the editor.', '2024-02-02T12:00:00Z'),
    ('650e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440003', 'Database notes', 'Foreign keys are worth the trouble.', '2024-02-04T08:30:00Z');

INSERT OR IGNORE INTO tags (id, name) VALUES
    ('350e8400-e29b-41d4-a716-446655440001', 'reading'),
    ('350e8400-e29b-41d4-a716-446655440002', 'meta');

INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES
    ('650e8400-e29b-41d4-a716-446655440002', '350e8400-e29b-41d4-a716-446655440001'),
    ('650e8400-e29b-41d4-a716-446655440001', '350e8400-e29b-41d4-a716-446655440002');

-- Seed comments: one top-level, one threaded reply
INSERT OR IGNORE INTO comments (id, post_id, author_id, content, parent_comment_id, created_at) VALUES
    ('750e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'Welcome aboard!', NULL, '2024-02-01T11:00:00Z'),
    ('750e8400-e29b-41d4-a716-446655440002', '650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', 'Thanks, glad to be here.', '750e8400-e29b-41d4-a716-446655440001', '2024-02-01T11:30:00Z');

-- Seed one follow edge: alice follows bob
INSERT OR IGNORE INTO follows (follower_id, following_id, created_at) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', '2024-01-10T00:00:00Z');
"#;
